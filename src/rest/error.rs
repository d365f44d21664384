use crate::Error;
use actix_web::{http::StatusCode, web::Json, HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;
use tracing::error;

pub type RestResult<T, E = RestApiError> = std::result::Result<Json<T>, E>;

/// Every failure is reported as HTTP 500 with an envelope whose shape
/// depends on the endpoint.
#[derive(Debug)]
pub struct RestApiError {
    pub code: RestApiErrorCode,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestApiErrorCode {
    ListCustomers,
    CountCustomers,
    Summary,
}

impl RestApiError {
    pub fn new(code: RestApiErrorCode, cause: Error) -> Self {
        error!(
            code = %code,
            timeout = cause.is_timeout(),
            error = %cause,
            "Request failed"
        );
        Self {
            code,
            details: cause.to_string(),
        }
    }

    pub fn list_customers(cause: Error) -> Self {
        Self::new(RestApiErrorCode::ListCustomers, cause)
    }

    pub fn count_customers(cause: Error) -> Self {
        Self::new(RestApiErrorCode::CountCustomers, cause)
    }

    pub fn summary(cause: Error) -> Self {
        Self::new(RestApiErrorCode::Summary, cause)
    }
}

impl RestApiErrorCode {
    pub fn message(&self) -> &'static str {
        match self {
            Self::ListCustomers => "Server error while fetching customers",
            Self::CountCustomers => "Server error while counting customers",
            Self::Summary => "Failed to generate summary data",
        }
    }

    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::ListCustomers => "Try with smaller page size or add database indexes",
            Self::CountCustomers => "Try again or check database performance",
            Self::Summary => "Try again with a smaller dataset or add more indexes",
        }
    }
}

impl fmt::Display for RestApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.message(), self.details)
    }
}

impl fmt::Display for RestApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListCustomers => write!(f, "list_customers"),
            Self::CountCustomers => write!(f, "count_customers"),
            Self::Summary => write!(f, "summary"),
        }
    }
}

impl ResponseError for RestApiError {
    fn error_response(&self) -> HttpResponse {
        let body = match self.code {
            RestApiErrorCode::Summary => json!({
                "status": "error",
                "message": self.code.message(),
                "error": self.details,
                "suggestion": self.code.suggestion(),
                "documentation": "Check the summary aggregation queries",
            }),
            _ => json!({
                "error": true,
                "message": self.code.message(),
                "details": self.details,
                "suggestion": self.code.suggestion(),
            }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
