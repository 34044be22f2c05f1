use crate::ipc::helpers::{get_optional_str, get_required_str, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, Backend};
use serde_json::json;
use std::path::PathBuf;

fn health(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.store.backend().as_str(),
    }))
}

fn store_info(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let s = state.store.as_ref();
    let db_path = match s.backend() {
        Backend::Sqlite => Some(state.db_path.to_string_lossy().to_string()),
        Backend::Memory => None,
    };
    Ok(json!({
        "backend": s.backend().as_str(),
        "dbPath": db_path,
        "counts": {
            "users": s.list_users()?.len(),
            "students": s.list_students()?.len(),
            "subjects": s.list_subjects()?.len(),
            "marks": s.list_marks()?.len(),
            "certificates": s.list_certificates()?.len(),
            "achievements": s.list_achievements()?.len(),
            "leaves": s.list_leaves()?.len(),
        },
    }))
}

fn store_select(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let raw = get_required_str(params, "backend")?;
    let backend = Backend::parse(&raw)
        .ok_or_else(|| HandlerErr::bad_params(format!("unknown backend: {}", raw)))?;
    let path = get_optional_str(params, "path")
        .map(PathBuf::from)
        .unwrap_or_else(|| state.db_path.clone());

    let opened = store::open_store(backend, &path, state.seed).map_err(|e| {
        HandlerErr::new("store_open_failed", format!("{e:?}"))
            .with_details(json!({ "path": path.to_string_lossy() }))
    })?;
    state.store = opened;
    state.db_path = path;
    tracing::info!(backend = backend.as_str(), path = %state.db_path.display(), "store selected");
    store_info(state)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "health" => health(state),
        "store.info" => store_info(state),
        "store.select" => store_select(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
