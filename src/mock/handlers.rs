use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::http::response::EdgeError;
use crate::http::server::AppState;
use crate::mock::extract::last_message_text;
use crate::mock::responder::MockAnswer;

async fn answer(state: &AppState, payload: &Value) -> MockAnswer {
    let instructions = last_message_text(payload);
    let answer = state.responder.respond(&instructions);
    if let Some(delay) = answer.delay {
        tracing::debug!(delay_ms = delay.as_millis() as u64, "Delaying mock answer");
        tokio::time::sleep(delay).await;
    }
    answer
}

/// `POST /v1/chat/completions`
pub async fn chat_completions(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Json<Value> {
    let answer = answer(&state, &payload).await;
    Json(json!({
        "id": 0,
        "choices": [{
            "index": 0,
            "finish_reason": "stop",
            "message": { "content": answer.text, "role": "assistant" }
        }]
    }))
}

/// `POST /v1/responses`
pub async fn responses(State(state): State<AppState>, Json(payload): Json<Value>) -> Json<Value> {
    let answer = answer(&state, &payload).await;
    let model = payload.get("model").cloned().unwrap_or_else(|| json!(""));
    Json(json!({
        "id": 0,
        "model": model,
        "output": [{
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "output_text", "text": answer.text }]
        }],
        "usage": { "input_tokens": 0, "output_tokens": 1, "total_tokens": 1 }
    }))
}

/// `GET /v1/models`
pub async fn list_models(State(state): State<AppState>) -> Result<Json<Value>, EdgeError> {
    let Some(path) = state.config.mock.models_file.as_deref() else {
        return Ok(Json(json!({ "object": "list", "data": [] })));
    };

    let raw = tokio::fs::read(path).await.map_err(|e| {
        tracing::error!(path = %path, error = %e, "Cannot read models file");
        EdgeError::ModelsFile
    })?;
    let models = serde_json::from_slice(&raw).map_err(|e| {
        tracing::error!(path = %path, error = %e, "Models file is not valid JSON");
        EdgeError::ModelsFile
    })?;
    Ok(Json(models))
}

/// `POST /`: echo, for checking the service is up.
pub async fn echo(Json(data): Json<Value>) -> Json<Value> {
    Json(json!({ "message": "Data received", "data": data }))
}
