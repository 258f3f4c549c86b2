use actix_web::{HttpResponse, Responder, get, post, web};
use cert_ledger::CertificateProof;
use log::{debug, info, warn};
use serde_json::Value;

use super::error_response;
use super::models::{AppState, ProofQuery, RejectedProofResponse, VerifyResponse};

/// Build an inclusion proof for a mined certificate.
#[get("/proof/")]
pub async fn generate_proof(
    state: web::Data<AppState>,
    query: web::Query<ProofQuery>,
) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    match ledger.prove(&query.student_id, &query.course) {
        Ok(artifact) => {
            debug!(
                "GET /proof/ - {}/{} found in block #{} at {}",
                query.student_id, query.course, artifact.block_index, artifact.tx_index
            );
            HttpResponse::Ok()
                .insert_header((
                    "Content-Disposition",
                    format!("attachment; filename=\"{}\"", artifact.file_name()),
                ))
                .json(artifact)
        }
        Err(err) => error_response(&err),
    }
}

/// Verify an exported proof. Does not touch the ledger.
///
/// A leaf with missing, mistyped or extra fields is not a certificate and is
/// answered with 400 and `valid: false`.
#[post("/proof/verify/")]
pub async fn verify_proof(body: web::Json<Value>) -> impl Responder {
    let artifact: CertificateProof = match serde_json::from_value(body.into_inner()) {
        Ok(artifact) => artifact,
        Err(err) => {
            warn!("POST /proof/verify/ - malformed artifact: {err}");
            return HttpResponse::BadRequest().json(RejectedProofResponse {
                valid: false,
                error: format!("malformed proof artifact: {err}"),
            });
        }
    };
    let valid = artifact.verify();
    info!(
        "POST /proof/verify/ - block #{} tx {}: {}",
        artifact.block_index,
        artifact.tx_index,
        if valid { "VERIFIED" } else { "INVALID" }
    );
    HttpResponse::Ok().json(VerifyResponse {
        valid,
        block_index: artifact.block_index,
        tx_index: artifact.tx_index,
    })
}
