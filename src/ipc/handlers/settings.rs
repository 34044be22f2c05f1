use crate::ipc::helpers::{parse_params, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::settings::SettingsPatch;
use serde_json::json;

fn settings_get(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({ "settings": state.settings.get() }))
}

/// Listeners run inside `update`, so the `settings.changed` event is already
/// queued when this returns.
fn settings_update(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let patch: SettingsPatch = parse_params(params)?;
    if patch.is_empty() {
        return Err(HandlerErr::bad_params("expected logoUrl or institutionName"));
    }
    if matches!(&patch.institution_name, Some(n) if n.trim().is_empty()) {
        return Err(HandlerErr::bad_params("institutionName must not be empty"));
    }
    let updated = state.settings.update(patch);
    Ok(json!({ "settings": updated }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "settings.get" => settings_get(state),
        "settings.update" => settings_update(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
