mod documents;

use axum::{extract::DefaultBodyLimit, routing::post, Json, Router};
use serde::Serialize;

use crate::state::AppState;

pub const WELCOME_MESSAGE: &str = "Welcome to the Document Processor Backend";

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new().route(
        "/process-documents/",
        post(documents::process_documents).layer(DefaultBodyLimit::max(max_upload_bytes)),
    )
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: WELCOME_MESSAGE,
    })
}
