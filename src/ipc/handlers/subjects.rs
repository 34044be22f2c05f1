use crate::import;
use crate::ipc::helpers::{
    get_optional_i64, get_optional_str, get_required_i64, get_required_str, get_year,
    import_rows, parse_param, respond, today, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{MarkRecord, NewSubject};
use crate::roster;
use crate::store::find_subject;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarkInput {
    student_id: i64,
    #[serde(default)]
    test1: f64,
    #[serde(default)]
    test2: f64,
    #[serde(default)]
    assignment: f64,
}

fn subjects_list(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let year = get_year(params);
    let subjects: Vec<_> = match roster::year_scope(year.as_deref()) {
        None => state.store.list_subjects()?,
        Some(y) => state
            .store
            .list_subjects()?
            .into_iter()
            .filter(|s| s.year == y)
            .collect(),
    };
    Ok(json!({ "subjects": subjects }))
}

fn subjects_create(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let subject = NewSubject {
        name: get_required_str(params, "name")?,
        code: get_required_str(params, "code")?,
        year: get_year(params).ok_or_else(|| HandlerErr::bad_params("missing year"))?,
        staff_id: get_optional_i64(params, "staffId")?.unwrap_or_default(),
        staff_name: get_optional_str(params, "staffName").unwrap_or_default(),
        total_students: get_optional_i64(params, "totalStudents")?.unwrap_or_default(),
        last_updated: today(),
    };
    let created = state.store.create_subject(subject)?;
    Ok(json!({ "subject": created }))
}

fn subjects_delete(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_i64(params, "id")?;
    if !state.store.delete_subject(id)? {
        return Err(HandlerErr::not_found(format!("subject {} not found", id)));
    }
    Ok(json!({ "deleted": id }))
}

fn marks_for_subject(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let subject = find_subject(state.store.as_ref(), get_required_i64(params, "subjectId")?)?;
    let sheet = roster::subject_sheet(state.store.as_ref(), &subject)?;
    Ok(json!({ "subject": subject, "marks": sheet }))
}

/// Writes marks for one subject and stamps the subject's last-updated date.
/// Totals are always recomputed here; anything the client sent is ignored.
fn marks_save(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let subject = find_subject(state.store.as_ref(), get_required_i64(params, "subjectId")?)?;
    let inputs: Vec<MarkInput> = parse_param(params, "marks")?;
    let known: HashSet<i64> = state.store.list_students()?.iter().map(|s| s.id).collect();

    let mut records = Vec::with_capacity(inputs.len());
    let mut unknown = Vec::new();
    for m in inputs {
        if !known.contains(&m.student_id) {
            unknown.push(m.student_id);
            continue;
        }
        records.push(MarkRecord {
            student_id: m.student_id,
            subject_id: subject.id,
            test1: m.test1,
            test2: m.test2,
            assignment: m.assignment,
        });
    }
    let saved = state.store.upsert_marks(&records)?;
    let stamped = today();
    state.store.touch_subject(subject.id, &stamped)?;
    tracing::info!(subject = %subject.code, saved, "marks saved");

    let subject = find_subject(state.store.as_ref(), subject.id)?;
    let sheet = roster::subject_sheet(state.store.as_ref(), &subject)?;
    Ok(json!({
        "saved": saved,
        "unknownStudents": unknown,
        "lastUpdated": stamped,
        "marks": sheet,
    }))
}

fn marks_for_student(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let email = get_required_str(params, "email")?;
    let marks = match roster::student_by_email(state.store.as_ref(), &email)? {
        Some(student) => roster::student_marks(state.store.as_ref(), &student)?,
        None => Vec::new(),
    };
    Ok(json!({ "marks": marks }))
}

fn marks_import(
    state: &mut AppState,
    params: &serde_json::Value,
    apply: bool,
) -> Result<serde_json::Value, HandlerErr> {
    let subject = find_subject(state.store.as_ref(), get_required_i64(params, "subjectId")?)?;
    let rows = import_rows(params)?;
    let before = roster::subject_sheet(state.store.as_ref(), &subject)?;
    let outcome = import::reconcile_marks(before.clone(), &rows);

    let mut written = 0usize;
    if apply {
        let changed: Vec<MarkRecord> = before
            .iter()
            .zip(outcome.records.iter())
            .filter(|(old, new)| old != new)
            .map(|(_, new)| new.record())
            .collect();
        if !changed.is_empty() {
            written = state.store.upsert_marks(&changed)?;
            state.store.touch_subject(subject.id, &today())?;
        }
        tracing::info!(
            subject = %subject.code,
            updated = outcome.updated,
            skipped = outcome.skipped,
            written,
            "marks import applied"
        );
    }
    Ok(json!({
        "subjectId": subject.id,
        "applied": apply,
        "updated": outcome.updated,
        "skipped": outcome.skipped,
        "written": written,
        "records": outcome.records,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "subjects.list" => subjects_list(state, &req.params),
        "subjects.create" => subjects_create(state, &req.params),
        "subjects.delete" => subjects_delete(state, &req.params),
        "marks.forSubject" => marks_for_subject(state, &req.params),
        "marks.save" => marks_save(state, &req.params),
        "marks.forStudent" => marks_for_student(state, &req.params),
        "marks.importPreview" => marks_import(state, &req.params, false),
        "marks.importApply" => marks_import(state, &req.params, true),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
