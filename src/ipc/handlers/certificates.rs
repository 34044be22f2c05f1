use crate::ipc::helpers::{get_required_i64, parse_enum, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::ReviewStatus;
use serde_json::json;

fn certificates_list(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({ "certificates": state.store.list_certificates()? }))
}

fn certificates_set_status(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_i64(params, "id")?;
    let status: ReviewStatus = parse_enum(params, "status")?;
    if !state.store.set_certificate_status(id, status)? {
        return Err(HandlerErr::not_found(format!("certificate {} not found", id)));
    }
    Ok(json!({ "id": id, "status": status }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "certificates.list" => certificates_list(state),
        "certificates.setStatus" => certificates_set_status(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
