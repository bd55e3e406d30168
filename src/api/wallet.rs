use actix_web::{HttpResponse, Responder, get};
use log::info;

use super::models::NewWalletResponse;
use crate::wallet::generate_keypair;

#[get("/generate_wallet")]
pub async fn generate_wallet() -> impl Responder {
    let keys = generate_keypair();
    info!("WALLET - generated address {}", keys.address);
    HttpResponse::Ok().json(NewWalletResponse {
        message: "wallet generated",
        private_key: keys.private_key,
        public_key: keys.public_key,
        address: keys.address,
    })
}
