use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::error::LedgerError;

#[derive(Serialize)]
struct ErrorBody {
    message: &'static str,
    error: String,
}

impl ResponseError for LedgerError {
    fn status_code(&self) -> StatusCode {
        match self {
            e if e.is_validation() => StatusCode::BAD_REQUEST,
            LedgerError::InvalidChain | LedgerError::StaleTip(_) => StatusCode::CONFLICT,
            LedgerError::Peer { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match status {
            StatusCode::BAD_REQUEST => "request rejected",
            StatusCode::CONFLICT => "chain changed, try again",
            StatusCode::BAD_GATEWAY => "peer unavailable",
            _ => "internal error",
        };
        HttpResponse::build(status).json(ErrorBody {
            message,
            error: self.to_string(),
        })
    }
}
