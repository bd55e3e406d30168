use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, MessageResponse, MinerStatusResponse, StartMiningQuery};
use crate::error::LedgerError;
use crate::miner::{StartOutcome, StopOutcome};

/// Start the mining loop. The reward address comes from the query string,
/// falling back to `MINER_PUBLIC_ADDRESS`.
#[get("/start_mining")]
pub async fn start_mining(
    state: web::Data<AppState>,
    query: web::Query<StartMiningQuery>,
) -> Result<HttpResponse, LedgerError> {
    let miner_address = query
        .into_inner()
        .miner_address
        .or_else(|| state.node.config().miner_address.clone())
        .ok_or_else(|| LedgerError::InvalidAddress(String::new()))?;

    let message = match state.miner.start(state.node.clone(), miner_address)? {
        StartOutcome::Started => "mining started",
        StartOutcome::AlreadyRunning => "mining is already running",
    };
    Ok(HttpResponse::Ok().json(MessageResponse::new(message)))
}

/// Stop after the current cycle; answers once the loop has exited.
#[get("/stop_mining")]
pub async fn stop_mining(state: web::Data<AppState>) -> impl Responder {
    let message = match state.miner.stop().await {
        StopOutcome::Stopped => "mining stopped",
        StopOutcome::NotRunning => "mining is not running",
    };
    HttpResponse::Ok().json(MessageResponse::new(message))
}

#[get("/status")]
pub async fn miner_status(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(MinerStatusResponse {
        status: state.miner.status(),
        miner_address: state.miner.miner_address(),
        height: state.node.chain_len(),
        pending: state.node.pending_transactions().len(),
    })
}
