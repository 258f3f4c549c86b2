use std::fs;
use std::path::{Component, Path, PathBuf};

use actix_web::{HttpResponse, Responder, get, post, web};
use cert_ledger::{LedgerError, MiningSignal, StorageError};
use log::{debug, info, warn};

use super::error_response;
use super::models::{
    AppState, ChainResponse, ErrorResponse, ExportRequest, ExportResponse, MineResponse,
    ValidateResponse,
};

/// Get the full blockchain.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(ChainResponse {
        length: ledger.len(),
        difficulty: ledger.difficulty(),
        chain: ledger.blocks(),
    })
}

/// Re-derive every block and report the first integrity violation, if any.
#[get("/chain/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    let result = ledger.verify_chain_integrity();
    HttpResponse::Ok().json(ValidateResponse {
        valid: result.is_ok(),
        length: ledger.len(),
        difficulty: ledger.difficulty(),
        error: result.err().map(|e| e.to_string()),
    })
}

/// Get a single block by index.
#[get("/blocks/{index}/")]
pub async fn get_block(state: web::Data<AppState>, path: web::Path<u64>) -> impl Responder {
    let index = path.into_inner();
    let ledger = state.ledger.lock().expect("mutex poisoned");
    match ledger.block_at(index) {
        Some(block) => HttpResponse::Ok().json(block),
        None => error_response(&LedgerError::BlockNotFound(index)),
    }
}

/// Mine the whole pending pool into a new block.
///
/// The nonce search runs on the blocking pool without holding the ledger, so
/// reads and submissions keep being served. Records submitted meanwhile wait
/// for the next block. When a mining timeout is configured, a watchdog
/// cancels the search once it elapses; the partial search is resumed by the
/// next request.
#[post("/mine/")]
pub async fn mine_block(state: web::Data<AppState>) -> impl Responder {
    let signal = MiningSignal::new();
    if let Some(timeout) = state.mining_timeout {
        let watchdog = signal.clone();
        actix_web::rt::spawn(async move {
            actix_web::rt::time::sleep(timeout).await;
            watchdog.cancel();
        });
    }

    let worker_state = state.clone();
    let outcome = web::block(move || {
        let _search = worker_state.mining.lock().expect("mutex poisoned");
        let mut pow = worker_state
            .ledger
            .lock()
            .expect("mutex poisoned")
            .start_mining()?;
        let difficulty = pow.difficulty();
        let status = pow.search(&signal);

        let mut ledger = worker_state.ledger.lock().expect("mutex poisoned");
        ledger
            .finish_mining(pow, status)
            .map(|block| MineResponse::from_block(block, difficulty))
    })
    .await;

    match outcome {
        Ok(Ok(resp)) => {
            info!(
                "MINER - sealed block #{} (hash={}, nonce={})",
                resp.mined_index, resp.hash, resp.nonce
            );
            HttpResponse::Ok().json(resp)
        }
        Ok(Err(err)) => {
            warn!("POST /mine/ - {err}");
            error_response(&err)
        }
        Err(err) => {
            warn!("POST /mine/ - mining worker failed: {err}");
            HttpResponse::InternalServerError().body("mining worker failed")
        }
    }
}

/// Resolve a client-supplied export name inside `dir`.
///
/// Only plain relative paths are accepted: no root, drive prefix, `.` or `..`.
pub(crate) fn export_path(dir: &Path, destination: &str) -> Option<PathBuf> {
    let relative = Path::new(destination.trim());
    let mut components = relative.components().peekable();
    components.peek()?;
    components
        .all(|c| matches!(c, Component::Normal(_)))
        .then(|| dir.join(relative))
}

/// Write the chain to a file inside the configured export directory.
#[post("/chain/export/")]
pub async fn export_chain(
    state: web::Data<AppState>,
    body: web::Json<ExportRequest>,
) -> impl Responder {
    let destination = body.into_inner().destination;
    let Some(target) = export_path(&state.export_dir, &destination) else {
        warn!("POST /chain/export/ - refused destination {destination:?}");
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: format!(
                "destination must be a relative path inside {}",
                state.export_dir.display()
            ),
        });
    };

    if let Some(parent) = target.parent() {
        if let Err(source) = fs::create_dir_all(parent) {
            let err = LedgerError::from(StorageError::Io {
                path: parent.to_path_buf(),
                source,
            });
            warn!("POST /chain/export/ - {err}");
            return error_response(&err);
        }
    }

    let ledger = state.ledger.lock().expect("mutex poisoned");
    debug!("POST /chain/export/ - exporting to {}", target.display());
    match ledger.export_to(&target) {
        Ok(()) => HttpResponse::Ok().json(ExportResponse {
            destination: target.display().to_string(),
            blocks: ledger.len(),
        }),
        Err(err) => {
            warn!("POST /chain/export/ - {err}");
            error_response(&err)
        }
    }
}
