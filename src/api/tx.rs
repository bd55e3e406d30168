use actix_web::{HttpResponse, post, web};

use super::models::{AddTransactionRequest, AddTransactionResponse, AppState};
use crate::error::LedgerError;

/// Sign a transfer with the sender's keys and queue it for mining.
#[post("/add_transaction")]
pub async fn add_transaction(
    state: web::Data<AppState>,
    body: web::Json<AddTransactionRequest>,
) -> Result<HttpResponse, LedgerError> {
    let tx = state.node.submit_transaction(
        &body.private_key_sender,
        &body.public_key_sender,
        &body.recipient_address,
        body.amount,
    )?;
    Ok(HttpResponse::Created().json(AddTransactionResponse {
        message: "transaction added to the pending pool",
        transaction: tx,
    }))
}
