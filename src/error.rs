use actix_web::{error::BlockingError, http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::{
    identity::IdentityError,
    model::{ErrorsModel, MsgModel},
    store::StoreError,
};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("No token, authorization denied")]
    Unauthenticated,

    #[error("Token is not valid")]
    InvalidToken,

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// Precondition failures clients historically receive as a 500.
    #[error("{0}")]
    NotPermitted(String),

    #[error("{0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl AppError {
    pub fn not_authorized() -> Self {
        AppError::Unauthorized("Not authorized".to_string())
    }

    pub fn conflict(msg: &str) -> Self {
        AppError::Conflict(msg.to_string())
    }

    pub fn not_found(msg: &str) -> Self {
        AppError::NotFound(msg.to_string())
    }

    pub fn not_permitted(msg: &str) -> Self {
        AppError::NotPermitted(msg.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Conflict(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthenticated | AppError::InvalidToken | AppError::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotPermitted(_) | AppError::Upstream(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            AppError::Validation(messages) => builder.json(ErrorsModel {
                errors: messages.iter().map(MsgModel::new).collect(),
            }),
            AppError::Conflict(msg) => builder.json(ErrorsModel {
                errors: vec![MsgModel::new(msg.as_str())],
            }),
            AppError::Internal(e) => {
                error!(error = %e, "request failed");
                builder.json(MsgModel::new("Server Error"))
            }
            AppError::Upstream(msg) => {
                error!(error = %msg, "identity gateway failure");
                builder.json(MsgModel::new(msg.as_str()))
            }
            other => builder.json(MsgModel::new(other.to_string())),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| (field.to_string(), errs))
            .collect::<Vec<_>>();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        AppError::Validation(
            fields
                .into_iter()
                .flat_map(|(field, errs)| {
                    errs.iter()
                        .map(move |e| match &e.message {
                            Some(message) => message.to_string(),
                            None => format!("Invalid {}", field),
                        })
                        .collect::<Vec<_>>()
                })
                .collect(),
        )
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Internal(Box::new(e))
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(e: diesel::result::Error) -> Self {
        AppError::Internal(Box::new(e))
    }
}

impl From<diesel::r2d2::PoolError> for AppError {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        AppError::Internal(Box::new(e))
    }
}

impl From<BlockingError> for AppError {
    fn from(e: BlockingError) -> Self {
        AppError::Internal(Box::new(e))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        AppError::Internal(Box::new(e))
    }
}

impl From<IdentityError> for AppError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::InvalidCredentials => AppError::Validation(vec![
                "Invalid Credentials".to_string(),
            ]),
            other => AppError::Internal(Box::new(other)),
        }
    }
}
