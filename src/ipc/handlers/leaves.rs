use crate::ipc::helpers::{
    get_optional_i64, get_required_i64, get_required_str, get_year, parse_enum, respond, today,
    HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{NewLeave, ReviewStatus, Student};
use crate::roster;
use crate::store::find_student;
use serde_json::json;
use std::collections::HashMap;

fn applicant(state: &AppState, params: &serde_json::Value) -> Result<Student, HandlerErr> {
    if let Some(id) = get_optional_i64(params, "studentId")? {
        return Ok(find_student(state.store.as_ref(), id)?);
    }
    let email = get_required_str(params, "email")?;
    roster::student_by_email(state.store.as_ref(), &email)?
        .ok_or_else(|| HandlerErr::not_found(format!("no student with email {}", email)))
}

fn leaves_apply(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student = applicant(state, params)?;
    let leave = state.store.insert_leave(NewLeave {
        student_id: student.id,
        student_name: student.name,
        roll_no: student.roll_no,
        leave_date: get_required_str(params, "leaveDate")?,
        reason: get_required_str(params, "reason")?,
        applied_on: today(),
    })?;
    Ok(json!({ "leave": leave }))
}

fn leaves_for_student(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let email = get_required_str(params, "email")?;
    let leaves: Vec<_> = match roster::student_by_email(state.store.as_ref(), &email)? {
        Some(s) => state
            .store
            .list_leaves()?
            .into_iter()
            .filter(|l| l.student_id == s.id)
            .collect(),
        None => Vec::new(),
    };
    Ok(json!({ "leaves": leaves }))
}

fn leaves_pending(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let year = get_year(params);
    let scope = roster::year_scope(year.as_deref());
    let years: HashMap<i64, Option<String>> = state
        .store
        .list_students()?
        .into_iter()
        .map(|s| (s.id, s.year))
        .collect();
    let leaves: Vec<_> = state
        .store
        .list_leaves()?
        .into_iter()
        .filter(|l| l.status == ReviewStatus::Pending)
        .filter(|l| match scope {
            None => true,
            Some(y) => years.get(&l.student_id).and_then(|v| v.as_deref()) == Some(y),
        })
        .collect();
    Ok(json!({ "leaves": leaves }))
}

fn leaves_set_status(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_i64(params, "id")?;
    let status: ReviewStatus = parse_enum(params, "status")?;
    if !state.store.set_leave_status(id, status)? {
        return Err(HandlerErr::not_found(format!("leave {} not found", id)));
    }
    Ok(json!({ "id": id, "status": status }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "leaves.apply" => leaves_apply(state, &req.params),
        "leaves.forStudent" => leaves_for_student(state, &req.params),
        "leaves.pending" => leaves_pending(state, &req.params),
        "leaves.setStatus" => leaves_set_status(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
