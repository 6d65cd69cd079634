use askama::Template;
use axum::{
    response::{IntoResponse, Redirect, Response},
    Extension,
};

use crate::{
    api::middleware::auth::CurrentUser,
    web::templates::{HtmlTemplate, UserInfo},
};

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub current_user: Option<UserInfo>,
}

// GET /login
pub async fn login_page(user: Option<Extension<CurrentUser>>) -> Response {
    if user.is_some() {
        return Redirect::to("/portal/dashboard").into_response();
    }

    HtmlTemplate(LoginTemplate { current_user: None }).into_response()
}
