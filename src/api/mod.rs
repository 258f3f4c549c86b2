mod certificates;
mod chain;
mod health;
pub mod models;
mod proof;

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use actix_web::web::{self, ServiceConfig};
use cert_ledger::LedgerError;

pub use models::AppState;
use models::ErrorResponse;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(certificates::submit_certificate)
            .service(certificates::get_pending)
            .service(chain::get_chain)
            .service(chain::validate_chain)
            .service(chain::get_block)
            .service(chain::mine_block)
            .service(chain::export_chain)
            .service(proof::generate_proof)
            .service(proof::verify_proof),
    );
}

/// Map a ledger failure to an HTTP status with a JSON error body.
pub(crate) fn error_response(err: &LedgerError) -> HttpResponse {
    let status = match err {
        LedgerError::DuplicatePending { .. }
        | LedgerError::DuplicateRecorded { .. }
        | LedgerError::StaleCandidate { .. } => StatusCode::CONFLICT,
        LedgerError::NoPendingRecords | LedgerError::InvalidProofIndex { .. } => {
            StatusCode::BAD_REQUEST
        }
        LedgerError::CertificateNotFound { .. } | LedgerError::BlockNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        LedgerError::MiningInterrupted { .. } => StatusCode::SERVICE_UNAVAILABLE,
        LedgerError::Persistence(_) | LedgerError::Integrity(_) | LedgerError::Encoding(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    HttpResponse::build(status).json(ErrorResponse {
        error: err.to_string(),
    })
}
