use crate::import::{self, AttendanceFormat};
use crate::ipc::helpers::{
    get_optional_str, get_year, import_rows, parse_param, respond, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{Student, StudentPatch};
use crate::roster;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttendanceEntry {
    student_id: i64,
    attendance: f64,
}

fn attendance_patch(value: f64) -> StudentPatch {
    StudentPatch {
        attendance: Some(value),
        ..StudentPatch::default()
    }
}

fn cohort(state: &AppState, year: &str) -> Result<Vec<Student>, HandlerErr> {
    Ok(roster::students_in_scope(
        state.store.list_students()?,
        Some(year),
    ))
}

fn attendance_list(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let year = get_year(params).ok_or_else(|| HandlerErr::bad_params("missing year"))?;
    let rows: Vec<serde_json::Value> = cohort(state, &year)?
        .into_iter()
        .map(|s| {
            json!({
                "studentId": s.id,
                "name": s.name,
                "rollNo": s.roll_no,
                "attendance": s.attendance,
            })
        })
        .collect();
    Ok(json!({ "year": year, "rows": rows }))
}

fn attendance_save(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let entries: Vec<AttendanceEntry> = parse_param(params, "entries")?;
    let mut updated = 0usize;
    let mut missing = Vec::new();
    for e in entries {
        if !e.attendance.is_finite() {
            return Err(HandlerErr::bad_params(format!(
                "attendance for student {} is not a number",
                e.student_id
            )));
        }
        let value = e.attendance.clamp(0.0, 100.0);
        if state.store.update_student(e.student_id, &attendance_patch(value))? {
            updated += 1;
        } else {
            missing.push(e.student_id);
        }
    }
    Ok(json!({ "updated": updated, "missing": missing }))
}

fn parse_format(params: &serde_json::Value) -> Result<AttendanceFormat, HandlerErr> {
    match get_optional_str(params, "format") {
        None => Ok(AttendanceFormat::default()),
        Some(raw) => AttendanceFormat::parse(&raw)
            .ok_or_else(|| HandlerErr::bad_params(format!("unknown attendance format: {}", raw))),
    }
}

fn attendance_import(
    state: &mut AppState,
    params: &serde_json::Value,
    apply: bool,
) -> Result<serde_json::Value, HandlerErr> {
    let year = get_year(params).ok_or_else(|| HandlerErr::bad_params("missing year"))?;
    let format = parse_format(params)?;
    let rows = import_rows(params)?;
    let before = cohort(state, &year)?;
    let outcome = import::reconcile_attendance(before.clone(), &rows, format);

    let mut written = 0usize;
    if apply {
        for (old, new) in before.iter().zip(outcome.records.iter()) {
            if old.attendance != new.attendance
                && state
                    .store
                    .update_student(new.id, &attendance_patch(new.attendance))?
            {
                written += 1;
            }
        }
        tracing::info!(
            year = %year,
            updated = outcome.updated,
            skipped = outcome.skipped,
            written,
            "attendance import applied"
        );
    }
    Ok(json!({
        "year": year,
        "applied": apply,
        "updated": outcome.updated,
        "skipped": outcome.skipped,
        "written": written,
        "records": outcome.records,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "attendance.list" => attendance_list(state, &req.params),
        "attendance.save" => attendance_save(state, &req.params),
        "attendance.importPreview" => attendance_import(state, &req.params, false),
        "attendance.importApply" => attendance_import(state, &req.params, true),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
