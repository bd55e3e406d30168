use actix_web::{HttpResponse, Responder, get, post, web};
use futures::future::join_all;

use super::models::{AppState, ConnectNodeResponse, Reachability};
use crate::error::LedgerError;
use crate::network::protocol::{ConnectNodeRequest, NodesResponse};

/// Wire route: this node's registry.
#[get("/get_my_nodes")]
pub async fn get_my_nodes(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(NodesResponse {
        message: "known nodes".to_string(),
        nodes: state.node.nodes(),
    })
}

/// Register peers and report which of them answer `/ping` right now.
/// Unreachable nodes are registered anyway.
#[post("/connect_node")]
pub async fn connect_node(
    state: web::Data<AppState>,
    body: web::Json<ConnectNodeRequest>,
) -> Result<HttpResponse, LedgerError> {
    if body.nodes.is_empty() {
        return Err(LedgerError::InvalidNode("empty node list".to_string()));
    }
    let endpoints: Vec<String> = body.nodes.iter().map(|n| n.endpoint()).collect();
    let total_nodes = state.node.connect_nodes(&endpoints)?;

    let node = &state.node;
    let reachability = join_all(endpoints.into_iter().map(|endpoint| async move {
        let reachable = node.check_node(&endpoint).await;
        Reachability {
            node: endpoint,
            reachable,
        }
    }))
    .await;

    Ok(HttpResponse::Ok().json(ConnectNodeResponse {
        message: "nodes registered",
        total_nodes,
        reachability,
    }))
}
