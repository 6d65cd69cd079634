use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::{
    api::state::AppState,
    auth::SESSION_COOKIE,
    domain::{Profile, RoleTier},
    error::{AppError, Result},
    service::ResolvedRole,
};

/// Identity and role of the caller, resolved once per request.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub profile: Profile,
    pub role: ResolvedRole,
}

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.profile.id
    }

    pub fn tier(&self) -> RoleTier {
        self.role.tier
    }
}

async fn authenticate(state: &AppState, jar: &CookieJar) -> Result<CurrentUser> {
    let session_cookie = jar
        .get(SESSION_COOKIE)
        .ok_or(AppError::Unauthorized)?;

    let ctx = &state.service_context;

    let session = ctx.auth_service
        .validate_session(session_cookie.value())
        .await?
        .ok_or(AppError::Unauthorized)?;

    let profile = ctx.profile_repo
        .find_by_id(session.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let role = ctx.role_resolver.resolve(profile.id).await?;

    Ok(CurrentUser { profile, role })
}

pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let user = authenticate(&state, &jar).await?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Staff-like and admin users.
pub async fn require_staff(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let user = authenticate(&state, &jar).await?;
    if !user.tier().can_author_notices() {
        return Err(AppError::Forbidden);
    }
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let user = authenticate(&state, &jar).await?;
    if !user.tier().is_admin() {
        return Err(AppError::Forbidden);
    }
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

pub async fn optional_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if jar.get(SESSION_COOKIE).is_some() {
        match authenticate(&state, &jar).await {
            Ok(user) => {
                request.extensions_mut().insert(user);
            }
            Err(e) => tracing::debug!("Ignoring invalid session: {}", e),
        }
    }

    next.run(request).await
}
