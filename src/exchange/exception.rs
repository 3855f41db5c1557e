use super::message::Response;
use crate::error::BoxError;
use http::StatusCode;
use std::fmt;

/// Outcome of pushing one request through a handler or filter
pub type HandlerResult = Result<Response, ResponseException>;

/// Controlled early termination of a chain.
///
/// Always carries a dispatch-ready [`Response`], so an uncaught exception can
/// be turned into what the client sees with [`ResponseException::into_response`].
#[derive(Debug)]
pub struct ResponseException {
    response: Response,
    cause: Option<BoxError>,
}

impl ResponseException {
    /// Exception carrying an empty response with `status`
    pub fn new(status: StatusCode) -> Self {
        Self::from_response(Response::new(status))
    }

    pub fn from_response(response: Response) -> Self {
        Self {
            response,
            cause: None,
        }
    }

    /// 500 Internal Server Error caused by `cause`.
    ///
    /// The cause is kept for logging but never written into the body.
    pub fn internal(cause: impl Into<BoxError>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR).with_cause(cause)
    }

    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn status(&self) -> StatusCode {
        self.response.status
    }

    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    pub fn into_response(self) -> Response {
        self.response
    }
}

impl From<Response> for ResponseException {
    fn from(response: Response) -> Self {
        Self::from_response(response)
    }
}

impl fmt::Display for ResponseException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request short-circuited with status {}", self.response.status)?;
        if let Some(cause) = &self.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ResponseException {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_internal_keeps_cause_out_of_body() {
        let exception = ResponseException::internal("database unreachable");

        assert_eq!(exception.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(exception.response().body.is_empty());
        assert_eq!(
            exception.source().map(|e| e.to_string()),
            Some("database unreachable".to_string())
        );
        assert!(exception.to_string().contains("database unreachable"));
    }

    #[test]
    fn test_into_response() {
        let response = Response::new(StatusCode::FORBIDDEN).with_body("denied");
        let exception = ResponseException::from(response.clone());

        assert!(exception.cause().is_none());
        assert_eq!(exception.into_response(), response);
    }
}
