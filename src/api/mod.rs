pub mod attendance;
pub mod dashboard;
pub mod employee;
pub mod export;

use actix_web::error::ErrorInternalServerError;
use tracing::error;

/// Log a storage failure and hide the details from the caller.
pub(crate) fn storage_failure(e: anyhow::Error, op: &'static str) -> actix_web::Error {
    error!(error = %e, op, "Storage failure");
    ErrorInternalServerError("Internal Server Error")
}
