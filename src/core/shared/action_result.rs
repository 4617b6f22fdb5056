//! The envelope every data access operation returns.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::core::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Unauthenticated,
    Forbidden,
    NotFound,
    Invalid,
    Internal,
}

impl FailureKind {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Invalid => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Serialized as `{ "success": bool, "message": string, "data"?: T }`.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult<T> {
    Success { message: String, data: T },
    Failure { kind: FailureKind, message: String },
}

impl<T> ActionResult<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self::Success {
            message: message.into(),
            data,
        }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. } | Self::Failure { message, .. } => message,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ActionResult<U> {
        match self {
            Self::Success { message, data } => ActionResult::Success {
                message,
                data: f(data),
            },
            Self::Failure { kind, message } => ActionResult::Failure { kind, message },
        }
    }
}

impl<T: Serialize> Serialize for ActionResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success { message, data } => {
                let mut s = serializer.serialize_struct("ActionResult", 3)?;
                s.serialize_field("success", &true)?;
                s.serialize_field("message", message)?;
                s.serialize_field("data", data)?;
                s.end()
            }
            Self::Failure { message, .. } => {
                let mut s = serializer.serialize_struct("ActionResult", 2)?;
                s.serialize_field("success", &false)?;
                s.serialize_field("message", message)?;
                s.end()
            }
        }
    }
}

impl<T: Serialize> IntoResponse for ActionResult<T> {
    fn into_response(self) -> Response {
        let status = self
            .failure_kind()
            .map(|kind| kind.status_code())
            .unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// Failure raised inside an operation before it reaches the envelope.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Invalid(String),
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

impl ActionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Unauthenticated(_) => FailureKind::Unauthenticated,
            Self::Forbidden(_) => FailureKind::Forbidden,
            Self::NotFound(_) => FailureKind::NotFound,
            Self::Invalid(_) => FailureKind::Invalid,
            Self::Store(_) => FailureKind::Internal,
        }
    }
}

/// Converts an operation outcome into the envelope. Store failures are logged
/// with full detail and reported to the caller only as `failure_message`.
pub fn settle<T>(
    outcome: Result<T, ActionError>,
    success_message: &str,
    failure_message: &str,
) -> ActionResult<T> {
    match outcome {
        Ok(data) => ActionResult::success(success_message, data),
        Err(ActionError::Store(e)) => {
            error!("{failure_message}: {e}");
            ActionResult::failure(FailureKind::Internal, failure_message)
        }
        Err(e) => ActionResult::failure(e.kind(), e.to_string()),
    }
}
