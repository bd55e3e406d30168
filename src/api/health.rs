use actix_web::{HttpResponse, Responder, get};

use crate::network::protocol::PingResponse;

/// Liveness probe used by other nodes.
#[get("/ping")]
pub async fn ping() -> impl Responder {
    HttpResponse::Ok().json(PingResponse {
        message: "pong".to_string(),
    })
}
