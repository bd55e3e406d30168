use actix_web::{HttpResponse, Responder, post, web};

use super::models::{AppState, BalanceRequest};

/// Balance and history over mined and pending transactions, ordered by
/// timestamp. Pending entries are marked `confirmed: false`.
#[post("/balance_and_transactions")]
pub async fn balance_and_transactions(
    state: web::Data<AppState>,
    body: web::Json<BalanceRequest>,
) -> impl Responder {
    let statement = state.node.balance_and_history(body.address.trim());
    HttpResponse::Ok().json(statement)
}
