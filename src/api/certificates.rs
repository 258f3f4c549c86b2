use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, warn};

use super::error_response;
use super::models::{AppState, PendingResponse, SubmitRequest, SubmitResponse};

/// Queue a certificate in the pending pool.
#[post("/certificates/")]
pub async fn submit_certificate(
    state: web::Data<AppState>,
    body: web::Json<SubmitRequest>,
) -> impl Responder {
    let req = body.into_inner();
    if req.student_id.trim().is_empty() || req.course.trim().is_empty() {
        warn!("POST /certificates/ - rejected: missing student_id or course");
        return HttpResponse::BadRequest().body("student_id and course are required");
    }

    let mut ledger = state.ledger.lock().expect("mutex poisoned");
    let result = ledger
        .submit(
            req.student_id.trim(),
            req.name.trim(),
            req.course.trim(),
            req.grade.trim(),
        )
        .cloned();

    match result {
        Ok(certificate) => {
            debug!(
                "POST /certificates/ - queued {}/{}",
                certificate.student_id, certificate.course
            );
            HttpResponse::Created().json(SubmitResponse {
                certificate,
                pending: ledger.pending().len(),
            })
        }
        Err(err) => {
            warn!("POST /certificates/ - rejected: {err}");
            error_response(&err)
        }
    }
}

/// List certificates waiting to be mined.
#[get("/certificates/pending/")]
pub async fn get_pending(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(PendingResponse {
        size: ledger.pending().len(),
        certificates: ledger.pending(),
    })
}
