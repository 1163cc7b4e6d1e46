//! Guarded data access functions: session check, one backend call,
//! staleness signal, then a result or a single human-readable error.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;

use crate::{auth::handlers::LOGIN_PATH, store::StoreError, validation::FieldErrors};

pub mod email;
pub mod experiences;
pub mod images;
pub mod projects;

pub const FEATURED_LIMIT: i64 = 3;

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// No admin session; callers abandon the action and go to the login page.
    #[error("login required")]
    LoginRequired,

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("You can only feature up to 3 projects on the homepage. Please unfeature one first.")]
    FeaturedLimit,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Confirmation required")]
    ConfirmationRequired,

    #[error("Another request for this action is already in progress")]
    InProgress,

    #[error("{0}")]
    TooLarge(String),

    /// Body could not be read as the expected form.
    #[error("{message}")]
    InvalidBody { status: StatusCode, message: String },

    #[error("{0}")]
    Backend(String),
}

pub type ActionResult<T> = Result<T, ActionError>;

impl From<StoreError> for ActionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { entity } => ActionError::NotFound(entity),
            StoreError::Backend(msg) => ActionError::Backend(msg),
        }
    }
}

impl From<JsonRejection> for ActionError {
    fn from(e: JsonRejection) -> Self {
        ActionError::InvalidBody {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl From<FieldErrors> for ActionError {
    fn from(e: FieldErrors) -> Self {
        ActionError::Validation(e)
    }
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        let status = match &self {
            ActionError::LoginRequired => return Redirect::to(LOGIN_PATH).into_response(),
            ActionError::Validation(fields) => {
                let body = json!({ "error": "Validation failed", "fields": fields });
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
            }
            ActionError::FeaturedLimit => StatusCode::CONFLICT,
            ActionError::NotFound(_) => StatusCode::NOT_FOUND,
            ActionError::ConfirmationRequired => StatusCode::PRECONDITION_REQUIRED,
            ActionError::InProgress => StatusCode::CONFLICT,
            ActionError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ActionError::InvalidBody { status, .. } => *status,
            ActionError::Backend(msg) => {
                tracing::error!(error = %msg, "backend operation failed");
                StatusCode::BAD_GATEWAY
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn render(err: ActionError) -> (StatusCode, Option<String>, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let location = res
            .headers()
            .get("location")
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, location, json)
    }

    #[tokio::test]
    async fn login_required_redirects_to_login() {
        let (status, location, _) = render(ActionError::LoginRequired).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/admin/login"));
    }

    #[tokio::test]
    async fn featured_limit_is_a_single_message() {
        let (status, _, json) = render(ActionError::FeaturedLimit).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            json["error"],
            "You can only feature up to 3 projects on the homepage. Please unfeature one first."
        );
        assert!(json.get("code").is_none());
    }

    #[tokio::test]
    async fn validation_lists_fields() {
        let mut fields = FieldErrors::default();
        fields.add("title", "Title is required");
        let (status, _, json) = render(ActionError::Validation(fields)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["fields"]["title"], "Title is required");
    }

    #[tokio::test]
    async fn invalid_body_is_a_single_message() {
        let (status, location, json) = render(ActionError::InvalidBody {
            status: StatusCode::BAD_REQUEST,
            message: "Failed to parse the request body as JSON".into(),
        })
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(location.is_none());
        assert_eq!(json["error"], "Failed to parse the request body as JSON");
    }
}
