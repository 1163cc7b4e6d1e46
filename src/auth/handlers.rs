use axum::{
    extract::{FromRef, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use super::{
    dto::{AuthResponse, LoginPrompt, LoginRequest, PublicUser, RefreshRequest},
    jwt::JwtKeys,
    password::verify_password,
    session::{clear_session_cookie, session_cookie, Session},
};
use crate::{state::AppState, validation::is_valid_email};

pub const LOGIN_PATH: &str = "/admin/login";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/me", get(get_me))
}

pub fn login_page_routes() -> Router<AppState> {
    Router::new().route(LOGIN_PATH, get(login_page))
}

type AuthRejection = (StatusCode, String);

fn issue_tokens(keys: &JwtKeys, user: PublicUser) -> Result<AuthResponse, AuthRejection> {
    let access_token = keys.sign_access(user.id).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    let refresh_token = keys.sign_refresh(user.id).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user,
    })
}

fn with_cookie(keys: &JwtKeys, body: AuthResponse) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    let cookie = session_cookie(&body.access_token, keys.access_ttl.as_secs());
    if let Ok(value) = cookie.parse() {
        headers.insert(header::SET_COOKIE, value);
    }
    (headers, Json(body))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthRejection> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }
    if payload.password.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Password is required".into()));
    }

    let user = match state.store.find_user_by_email(&payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %payload.email, "login unknown email");
            return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
        }
        Err(e) => {
            error!(error = %e, "find_user_by_email failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let ok = verify_password(&payload.password, &user.password_hash).map_err(|e| {
        error!(error = %e, "verify_password failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let body = issue_tokens(
        &keys,
        PublicUser {
            id: user.id,
            email: user.email,
        },
    )?;
    info!(user_id = %body.user.id, "admin logged in");
    Ok(with_cookie(&keys, body))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AuthRejection> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

    let user = state
        .store
        .find_user_by_id(claims.sub)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    let body = issue_tokens(
        &keys,
        PublicUser {
            id: user.id,
            email: user.email,
        },
    )?;
    Ok(with_cookie(&keys, body))
}

#[instrument(skip_all)]
pub async fn logout(session: Session) -> impl IntoResponse {
    if let Some(admin) = session.identity() {
        info!(user_id = %admin.id, "admin logged out");
    }
    let mut headers = HeaderMap::new();
    if let Ok(value) = clear_session_cookie().parse() {
        headers.insert(header::SET_COOKIE, value);
    }
    (StatusCode::NO_CONTENT, headers)
}

#[instrument(skip_all)]
pub async fn get_me(session: Session) -> Result<Json<PublicUser>, AuthRejection> {
    let admin = session
        .identity()
        .ok_or((StatusCode::UNAUTHORIZED, "Not signed in".to_string()))?;
    Ok(Json(PublicUser {
        id: admin.id,
        email: admin.email.clone(),
    }))
}

pub async fn login_page() -> Json<LoginPrompt> {
    Json(LoginPrompt {
        message: "Sign in to manage the portfolio",
        login_endpoint: "/api/v1/auth/login",
    })
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::{app::build_app, state::AppState};

    async fn post_json(
        app: axum::Router,
        uri: &str,
        body: serde_json::Value,
    ) -> axum::response::Response {
        app.oneshot(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn login_issues_tokens_and_cookie() {
        let state = AppState::fake();
        state.seed_admin("admin@portfolio.test", "correct-horse").await;
        let app = build_app(state);

        let res = post_json(
            app,
            "/api/v1/auth/login",
            serde_json::json!({ "email": " Admin@Portfolio.test ", "password": "correct-horse" }),
        )
        .await;
        assert_eq!(res.status(), axum::http::StatusCode::OK);
        let cookie = res.headers()["set-cookie"].to_str().unwrap().to_string();
        assert!(cookie.starts_with("admin_session="));

        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["user"]["email"], "admin@portfolio.test");
        assert!(json["access_token"].as_str().is_some());
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let state = AppState::fake();
        state.seed_admin("admin@portfolio.test", "correct-horse").await;
        let app = build_app(state);

        let res = post_json(
            app,
            "/api/v1/auth/login",
            serde_json::json!({ "email": "admin@portfolio.test", "password": "nope-nope" }),
        )
        .await;
        assert_eq!(res.status(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
