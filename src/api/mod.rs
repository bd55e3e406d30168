mod balance;
mod chain;
mod errors;
mod health;
mod mining;
pub mod models;
mod nodes;
mod tx;
mod wallet;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

/// Chains travel whole between nodes, so the JSON body limit is generous.
const MAX_JSON_BYTES: usize = 64 * 1024 * 1024;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(MAX_JSON_BYTES))
        .service(health::ping)
        .service(chain::get_chain)
        .service(chain::new_blockchain)
        .service(nodes::get_my_nodes)
        .service(nodes::connect_node)
        .service(
            web::scope("/wallet")
                .service(wallet::generate_wallet)
                .service(tx::add_transaction)
                .service(balance::balance_and_transactions),
        )
        .service(
            web::scope("/miner")
                .service(mining::start_mining)
                .service(mining::stop_mining)
                .service(mining::miner_status)
                .service(chain::get_actual_chain)
                .service(chain::update_blockchain)
                .service(chain::is_valid),
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::model::tests::chain_of;
    use crate::node::tests::test_node;
    use crate::wallet::generate_keypair;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    macro_rules! app {
        ($state:expr) => {
            test::init_service(App::new().app_data($state.clone()).configure(init_routes)).await
        };
    }

    fn state_in(dir: &std::path::Path) -> web::Data<AppState> {
        web::Data::new(AppState::new(Arc::new(test_node(dir))))
    }

    #[actix_web::test]
    async fn ping_and_chain() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let app = app!(state);

        let req = test::TestRequest::get().uri("/ping").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "message": "pong" }));

        let req = test::TestRequest::get().uri("/get_chain").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["length"], 1);
        assert_eq!(body["chain"][0]["previous_hash"], "0");

        let req = test::TestRequest::get().uri("/miner/is_valid").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["valid"], true);
    }

    #[actix_web::test]
    async fn wallet_flow_reports_rejection_reason() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/wallet/generate_wallet")
            .to_request();
        let wallet: Value = test::call_and_read_body_json(&app, req).await;
        let address = wallet["address"].as_str().unwrap().to_string();
        let recipient = generate_keypair();

        let req = test::TestRequest::post()
            .uri("/wallet/add_transaction")
            .set_json(json!({
                "private_key_sender": wallet["private_key"],
                "public_key_sender": wallet["public_key"],
                "recipient_address": recipient.address,
                "amount": 5.0,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("insufficient balance"));

        state.node.mine_block(&address).await.unwrap();

        let req = test::TestRequest::post()
            .uri("/wallet/add_transaction")
            .set_json(json!({
                "private_key_sender": wallet["private_key"],
                "public_key_sender": wallet["public_key"],
                "recipient_address": recipient.address,
                "amount": 5.0,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/wallet/balance_and_transactions")
            .set_json(json!({ "address": address }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["balance"], 95.0);
        assert_eq!(body["transactions"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn connect_node_validates_and_registers() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/connect_node")
            .set_json(json!({ "nodes": [] }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/connect_node")
            .set_json(json!({ "nodes": [{ "node_address": "127.0.0.1", "port": 9 }] }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total_nodes"], json!(["127.0.0.1:9"]));
        assert_eq!(body["reachability"][0]["reachable"], false);

        let req = test::TestRequest::get().uri("/get_my_nodes").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["nodes"], json!(["127.0.0.1:9"]));
    }

    #[actix_web::test]
    async fn new_blockchain_adopts_only_longer_valid_chains() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let app = app!(state);
        let longer = chain_of(3).blocks().to_vec();

        let mut forged = longer.clone();
        forged[1].proof += 1;
        let req = test::TestRequest::post()
            .uri("/new_blockchain")
            .set_json(json!({ "chain": forged, "nodes_updated": ["127.0.0.1:5001"] }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["replaced"], false);
        assert_eq!(state.node.chain_len(), 1);

        let req = test::TestRequest::post()
            .uri("/new_blockchain")
            .set_json(json!({ "chain": longer, "nodes_updated": ["127.0.0.1:5001"] }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["replaced"], true);
        assert_eq!(body["nodes_updated"], json!(["127.0.0.1:5001", "127.0.0.1:5000"]));
        assert_eq!(state.node.chain_snapshot(), longer);
    }

    #[actix_web::test]
    async fn miner_routes() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let app = app!(state);

        let req = test::TestRequest::get().uri("/miner/status").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "idle");

        let req = test::TestRequest::get().uri("/miner/start_mining").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let miner = generate_keypair();
        let req = test::TestRequest::get()
            .uri(&format!("/miner/start_mining?miner_address={}", miner.address))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "mining started");

        let req = test::TestRequest::get().uri("/miner/status").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "mining");

        let req = test::TestRequest::get().uri("/miner/stop_mining").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "mining stopped");
        assert_eq!(state.miner.status(), crate::miner::MinerStatus::Idle);
    }
}
