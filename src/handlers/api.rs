use axum::Json;
use serde_json::{Value, json};

// GET /api - static description of what we serve
pub async fn api_handler() -> Json<Value> {
    Json(json!({
        "name": "Portfolio Contact API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "contact": "POST /contact",
            "health": "GET /health"
        }
    }))
}
