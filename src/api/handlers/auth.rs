use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    auth::{AuthService, SESSION_COOKIE},
    domain::{AppRole, Profile, RoleTier, SignUpRequest},
    error::Result,
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub profile: Profile,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub profile: Profile,
    pub role: AppRole,
    pub tier: RoleTier,
    pub role_defaulted: bool,
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<SignUpRequest>,
) -> Result<(StatusCode, CookieJar, Json<LoginResponse>)> {
    let auth_service = &state.service_context.auth_service;

    let profile = auth_service.sign_up(req).await?;
    let (_session, token) = auth_service.create_session(profile.id).await?;
    let cookie = auth_service.create_session_cookie(&token, state.settings.auth.secure_cookies);

    Ok((
        StatusCode::CREATED,
        jar.add(cookie),
        Json(LoginResponse {
            message: "Account created".to_string(),
            profile,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let auth_service = &state.service_context.auth_service;

    let (profile, token) = auth_service.sign_in(&req.email, &req.password).await?;
    let cookie = auth_service.create_session_cookie(&token, state.settings.auth.secure_cookies);

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            message: "Login successful".to_string(),
            profile,
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode)> {
    if let Some(session_cookie) = jar.get(SESSION_COOKIE) {
        state.service_context.auth_service
            .sign_out(session_cookie.value())
            .await?;
    }

    Ok((jar.add(AuthService::create_logout_cookie()), StatusCode::NO_CONTENT))
}

pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<MeResponse> {
    Json(MeResponse {
        role: user.role.role,
        tier: user.role.tier,
        role_defaulted: user.role.defaulted,
        profile: user.profile,
    })
}
