mod api;
mod blockchain;
mod config;
mod error;
mod miner;
mod network;
mod node;
mod storage;
mod transaction;
mod wallet;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::{info, warn};
use std::sync::Arc;

use api::AppState;
use config::NodeConfig;
use node::Node;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = NodeConfig::from_env();
    let (host, port) = (config.host.clone(), config.port);

    let node = Arc::new(Node::open(config).map_err(std::io::Error::other)?);
    match node.reconcile().await {
        Ok(Some(chain)) => info!("SYNC - startup: adopted chain of {} blocks", chain.len()),
        Ok(None) => info!("SYNC - startup: keeping local chain of {} blocks", node.chain_len()),
        Err(e) => warn!("SYNC - startup reconcile failed: {e}"),
    }

    info!("NODE - serving {} at http://{host}:{port}", node.my_node());

    let state = web::Data::new(AppState::new(node));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
