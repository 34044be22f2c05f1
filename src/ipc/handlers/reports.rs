use crate::export::{self, Sheet};
use crate::ipc::helpers::{
    get_optional_str, get_required_i64, get_required_str, get_year, respond, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::leaderboard::{self, Metric};
use crate::model::Student;
use crate::roster;
use crate::seed::INTERNSHIP_CATEGORY_ID;
use crate::stats::{self, YearlyStats};
use crate::store::find_subject;
use serde_json::json;
use std::path::PathBuf;

fn required_year(params: &serde_json::Value) -> Result<String, HandlerErr> {
    let year = get_year(params).ok_or_else(|| HandlerErr::bad_params("missing year"))?;
    match roster::year_scope(Some(&year)) {
        Some(y) => Ok(y.to_string()),
        None => Err(HandlerErr::bad_params("year must name a single year")),
    }
}

fn year_cohort(state: &AppState, year: &str) -> Result<(YearlyStats, Vec<Student>), HandlerErr> {
    let students = roster::students_in_scope(state.store.list_students()?, Some(year));
    let achievements = state.store.list_achievements()?;
    let summary = stats::yearly_stats(year, &students, &achievements, INTERNSHIP_CATEGORY_ID);
    Ok((summary, students))
}

fn stats_year(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let year = required_year(params)?;
    let (summary, _) = year_cohort(state, &year)?;
    Ok(json!({ "stats": summary }))
}

fn stats_subject(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let subject = find_subject(state.store.as_ref(), get_required_i64(params, "subjectId")?)?;
    let sheet = roster::subject_sheet(state.store.as_ref(), &subject)?;
    Ok(json!({ "stats": stats::subject_stats(subject.id, &sheet) }))
}

fn write(out: PathBuf, sheets: &[Sheet]) -> Result<serde_json::Value, HandlerErr> {
    let summary = export::write_workbook(&out, sheets).map_err(|e| {
        HandlerErr::new("export_failed", format!("{e:?}"))
            .with_details(json!({ "path": out.to_string_lossy() }))
    })?;
    tracing::info!(path = %out.display(), export_id = %summary.export_id, "workbook written");
    Ok(json!({
        "path": out.to_string_lossy(),
        "workbook": summary,
    }))
}

fn export_leaderboard(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let out = PathBuf::from(get_required_str(params, "out")?);
    let metric = match get_optional_str(params, "metric") {
        None => Metric::Marks,
        Some(raw) => Metric::parse(&raw)
            .ok_or_else(|| HandlerErr::bad_params(format!("unknown metric: {}", raw)))?,
    };
    let year = get_year(params);
    let entries = leaderboard::department_board(state.store.as_ref(), metric, year.as_deref())?;
    write(out, &[export::leaderboard_sheet(&entries)])
}

fn export_year_report(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let out = PathBuf::from(get_required_str(params, "out")?);
    let year = required_year(params)?;
    let (summary, students) = year_cohort(state, &year)?;
    write(out, &export::year_report_sheets(&summary, &students))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "stats.year" => stats_year(state, &req.params),
        "stats.subject" => stats_subject(state, &req.params),
        "export.leaderboard" => export_leaderboard(state, &req.params),
        "export.yearReport" => export_year_report(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
