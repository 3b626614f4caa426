use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::domain::cart::CartError;
use crate::domain::checkout::CheckoutError;
use crate::domain::inventory::InventoryError;
use crate::domain::order::OrderError;
use crate::domain::returns::ReturnError;
use crate::domain::{Classify, ErrorKind};
use crate::storage::StoreError;

/// Error surfaced over HTTP as `{"error": <kind>, "message": <text>}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing or malformed X-User-Id header")]
    Unauthenticated,

    #[error("{message}")]
    Domain { kind: ErrorKind, message: String },
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ApiError::Domain {
            kind,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    fn label(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated => "unauthenticated",
            ApiError::Domain { kind, .. } => match kind {
                ErrorKind::Validation => "validation",
                ErrorKind::Conflict => "conflict",
                ErrorKind::NotFound => "not_found",
                ErrorKind::Forbidden => "forbidden",
                ErrorKind::Infrastructure => "infrastructure",
            },
        }
    }

    fn classified<E: Classify + fmt::Display>(err: E) -> Self {
        let kind = err.kind();
        if kind == ErrorKind::Infrastructure {
            tracing::error!(error = %err, "Request failed on storage");
            return Self::new(kind, "storage failure, nothing was persisted");
        }
        Self::new(kind, err.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Domain { kind, .. } => match kind {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                ErrorKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.label(),
            message: self.to_string(),
        })
    }
}

macro_rules! classified_from {
    ($($error:ty),* $(,)?) => {
        $(
            impl From<$error> for ApiError {
                fn from(err: $error) -> Self {
                    ApiError::classified(err)
                }
            }
        )*
    };
}

classified_from!(CartError, CheckoutError, InventoryError, OrderError, ReturnError);

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::classified(InventoryError::from(err))
    }
}
