use crate::ipc::helpers::{get_required_i64, get_year, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::leaderboard::{self, Metric};
use crate::roster;
use crate::store::find_subject;
use serde_json::json;

fn board(
    state: &mut AppState,
    params: &serde_json::Value,
    metric: Metric,
) -> Result<serde_json::Value, HandlerErr> {
    let year = get_year(params);
    let entries = leaderboard::department_board(state.store.as_ref(), metric, year.as_deref())?;
    Ok(json!({ "entries": entries }))
}

fn subject_board(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let subject = find_subject(state.store.as_ref(), get_required_i64(params, "subjectId")?)?;
    let marks = roster::recorded_subject_marks(state.store.as_ref(), &subject)?;
    Ok(json!({
        "subjectId": subject.id,
        "entries": leaderboard::subject_leaderboard(marks),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "leaderboard.marks" => board(state, &req.params, Metric::Marks),
        "leaderboard.achievements" => board(state, &req.params, Metric::Achievements),
        "leaderboard.subject" => subject_board(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
