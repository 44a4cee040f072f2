use crate::error::{FieldError, LoyaltyError};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;

/// Everything a handler can answer with besides success.
///
/// Internal failures carry only the client-facing message; the cause is
/// logged where the error is converted.
#[derive(Debug)]
pub enum ApiError {
    /// A path id that is not a positive integer. Holds the entity label.
    InvalidId(&'static str),
    BadRequest(String),
    Validation(Vec<FieldError>),
    NotFound(String),
    Conflict(String),
    Internal(&'static str),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Map a core error onto the HTTP taxonomy. `action` is the generic
    /// message returned on a 500, e.g. "Failed to fetch wallet".
    pub fn from_core(err: LoyaltyError, action: &'static str) -> Self {
        match err {
            LoyaltyError::Validation(errors) => Self::Validation(errors),
            LoyaltyError::NotFound { entity, .. } => Self::NotFound(format!("{entity} not found")),
            LoyaltyError::Conflict(message) => Self::Conflict(message),
            other => {
                log::error!("{action}: {other}");
                Self::Internal(action)
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidId(_) | Self::BadRequest(_) | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::InvalidId(entity) => json!({ "error": format!("Invalid {entity} ID") }),
            Self::Validation(errors) => json!({ "error": errors }),
            Self::BadRequest(message) | Self::NotFound(message) | Self::Conflict(message) => {
                json!({ "error": message })
            }
            Self::Internal(action) => json!({ "error": action }),
        };
        (status, Json(body)).into_response()
    }
}

/// `Json<T>` whose rejection is a structured 400 instead of axum's plain text.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                log::warn!("rejected request body: {}", rejection.body_text());
                Err(json_rejection(rejection))
            }
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    let field = match rejection {
        JsonRejection::MissingJsonContentType(_) => "contentType",
        _ => "body",
    };
    ApiError::Validation(vec![FieldError::new(field, rejection.body_text())])
}
