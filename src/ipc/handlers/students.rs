use crate::ipc::helpers::{
    get_required_i64, get_required_str, get_year, parse_param, parse_params, respond, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{NewStudent, StudentPatch};
use crate::roster;
use crate::store::find_student;
use serde_json::json;

fn students_list(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let year = get_year(params);
    let students = roster::students_in_scope(state.store.list_students()?, year.as_deref());
    Ok(json!({ "students": students }))
}

fn students_create(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let new: NewStudent = parse_params(params)?;
    if new.name.trim().is_empty() || new.roll_no.trim().is_empty() {
        return Err(HandlerErr::bad_params("name and rollNo are required"));
    }
    let created = state.store.insert_student(new)?;
    Ok(json!({ "student": created }))
}

fn students_update(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_i64(params, "id")?;
    let patch: StudentPatch = parse_param(params, "patch")?;
    if patch.is_empty() {
        return Err(HandlerErr::bad_params("patch has no fields"));
    }
    if !state.store.update_student(id, &patch)? {
        return Err(HandlerErr::not_found(format!("student {} not found", id)));
    }
    let student = find_student(state.store.as_ref(), id)?;
    Ok(json!({ "student": student }))
}

fn students_profile(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let email = get_required_str(params, "email")?;
    match roster::profile_by_email(state.store.as_ref(), &email)? {
        Some(profile) => Ok(json!({ "profile": profile })),
        None => Err(HandlerErr::not_found(format!("no student profile for {}", email))),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "students.list" => students_list(state, &req.params),
        "students.create" => students_create(state, &req.params),
        "students.update" => students_update(state, &req.params),
        "students.profile" => students_profile(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
