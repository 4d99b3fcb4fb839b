use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use trellis_resolve::ResolveError;
use trellis_store::StoreError;
use trellis_types::TypeError;

#[derive(Debug, Error)]
pub enum ServerError {
    /// An identifier failed boundary validation. The reason stays out of the
    /// response body.
    #[error("bad argument")]
    BadArgument(#[from] TypeError),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("bad action: {0}")]
    BadAction(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("node payload is not JSON: {0}")]
    NotJson(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadArgument(_) | Self::MissingArgument(_) | Self::BadAction(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Resolve(ResolveError::NotFound(_) | ResolveError::BadUrl(_))
            | Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::BadArgument(reason) => tracing::debug!(%reason, "rejected request argument"),
            _ if status.is_server_error() => tracing::error!(error = %self, "request failed"),
            _ => {}
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let bad = ServerError::BadArgument(TypeError::BadArgument {
            name: "repo_id".into(),
            reason: "dot".into(),
        });
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        assert_eq!(bad.to_string(), "bad argument");
        assert_eq!(
            ServerError::BadAction("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::from(ResolveError::BadUrl("u".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::from(StoreError::NotFound("p".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::from(ResolveError::Engine("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn resolve_messages_pass_through() {
        let err = ServerError::from(ResolveError::NotFound("id:9".into()));
        assert_eq!(err.to_string(), "data not found (id:9)");
    }
}
