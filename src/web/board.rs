use askama::Template;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    Extension,
};

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{NoticeCategory, NoticeQuery, NoticeSort},
    web::templates::{cards, HtmlTemplate, NoticeCard, UserInfo},
};

const SORTS: [(NoticeSort, &str, &str); 3] = [
    (NoticeSort::Newest, "newest", "Newest"),
    (NoticeSort::Oldest, "oldest", "Oldest"),
    (NoticeSort::MostViewed, "most_viewed", "Most viewed"),
];

/// One `<option>` in the filter bar.
pub struct FilterOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "board.html")]
pub struct BoardTemplate {
    pub current_user: Option<UserInfo>,
    pub notices: Vec<NoticeCard>,
    pub categories: Vec<FilterOption>,
    pub sorts: Vec<FilterOption>,
    pub search: String,
    pub error: Option<String>,
}

/// Public notice board: approved notices, newest first.
pub async fn board_page(
    State(state): State<AppState>,
    query: Result<Query<NoticeQuery>, QueryRejection>,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let current_user = user.as_ref().map(|Extension(u)| UserInfo::from(u));

    // A bad filter falls back to the unfiltered board with a message.
    let (query, mut error) = match query {
        Ok(Query(query)) => (query, None),
        Err(rejection) => {
            tracing::debug!("Ignoring board filters: {}", rejection.body_text());
            (NoticeQuery::default(), Some("Unknown filter; showing all notices.".to_string()))
        }
    };

    let notices = match state.service_context.notice_service.list_approved(&query).await {
        Ok(notices) => cards(&notices),
        Err(e) => {
            tracing::error!("Failed to load notice board: {}", e);
            error = Some("Notices could not be loaded right now.".to_string());
            Vec::new()
        }
    };

    let categories = NoticeCategory::ALL
        .into_iter()
        .map(|c| FilterOption {
            value: c.as_str(),
            label: c.label(),
            selected: query.category == Some(c),
        })
        .collect();

    let sorts = SORTS
        .into_iter()
        .map(|(sort, value, label)| FilterOption {
            value,
            label,
            selected: query.sort == sort,
        })
        .collect();

    HtmlTemplate(BoardTemplate {
        current_user,
        notices,
        categories,
        sorts,
        search: query.search.unwrap_or_default(),
        error,
    })
    .into_response()
}
