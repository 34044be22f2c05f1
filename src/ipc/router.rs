use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;

type Handler = fn(&mut AppState, &Request) -> Option<serde_json::Value>;

const HANDLERS: &[Handler] = &[
    handlers::core::try_handle,
    handlers::users::try_handle,
    handlers::students::try_handle,
    handlers::attendance::try_handle,
    handlers::subjects::try_handle,
    handlers::certificates::try_handle,
    handlers::achievements::try_handle,
    handlers::leaves::try_handle,
    handlers::leaderboard::try_handle,
    handlers::reports::try_handle,
    handlers::settings::try_handle,
];

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    for handler in HANDLERS {
        if let Some(resp) = handler(state, &req) {
            return resp;
        }
    }
    tracing::debug!(method = %req.method, "unknown method");
    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
