use actix_web::{HttpResponse, Responder, get, post, web};
use log::info;

use super::models::{ActualChainResponse, AppState, UpdateChainResponse, ValidityResponse};
use crate::error::LedgerError;
use crate::network::RemoteChainOutcome;
use crate::network::protocol::{ChainResponse, NewBlockchainRequest, NewBlockchainResponse};

/// Wire route: the full local chain.
#[get("/get_chain")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let chain = state.node.chain_snapshot();
    HttpResponse::Ok().json(ChainResponse {
        length: chain.len(),
        chain,
    })
}

#[get("/get_actual_chain")]
pub async fn get_actual_chain(state: web::Data<AppState>) -> impl Responder {
    let chain = state.node.chain_snapshot();
    HttpResponse::Ok().json(ActualChainResponse {
        message: "current local chain",
        length: chain.len(),
        actual_chain: chain,
    })
}

/// Pull from every peer and adopt the longest valid chain.
#[get("/update_blockchain")]
pub async fn update_blockchain(state: web::Data<AppState>) -> Result<HttpResponse, LedgerError> {
    let replaced = state.node.reconcile().await?.is_some();
    let message = if replaced {
        "chain replaced by a longer valid chain"
    } else {
        "local chain is already the longest"
    };
    Ok(HttpResponse::Ok().json(UpdateChainResponse {
        message,
        replaced,
        chain: state.node.chain_snapshot(),
    }))
}

#[get("/is_valid")]
pub async fn is_valid(state: web::Data<AppState>) -> impl Responder {
    let valid = state.node.is_chain_valid();
    HttpResponse::Ok().json(ValidityResponse {
        message: if valid { "chain is valid" } else { "chain is invalid" },
        valid,
        length: state.node.chain_len(),
    })
}

/// Wire route: a peer pushing its chain after mining or adopting one.
#[post("/new_blockchain")]
pub async fn new_blockchain(
    state: web::Data<AppState>,
    body: web::Json<NewBlockchainRequest>,
) -> Result<HttpResponse, LedgerError> {
    let NewBlockchainRequest {
        chain,
        nodes_updated,
    } = body.into_inner();
    info!("SYNC - received chain of {} blocks", chain.len());

    let resp = match state.node.accept_remote_chain(chain, nodes_updated.clone())? {
        RemoteChainOutcome::Adopted {
            length,
            nodes_updated,
        } => NewBlockchainResponse {
            message: "chain replaced".to_string(),
            replaced: true,
            length,
            nodes_updated,
        },
        RemoteChainOutcome::NotLonger { local_length } => NewBlockchainResponse {
            message: "local chain is as long or longer".to_string(),
            replaced: false,
            length: local_length,
            nodes_updated,
        },
        RemoteChainOutcome::Invalid => NewBlockchainResponse {
            message: "received chain is invalid".to_string(),
            replaced: false,
            length: state.node.chain_len(),
            nodes_updated,
        },
    };
    Ok(HttpResponse::Ok().json(resp))
}
