use crate::ipc::helpers::{
    get_optional_i64, get_optional_str, get_required_i64, get_required_str, get_year,
    parse_enum, respond, today, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{Achievement, AchievementReview, AchievementStatus, NewAchievement, Student};
use crate::roster::{self, AchievementView};
use crate::store::find_student;
use serde_json::json;

fn views(
    state: &AppState,
    filter: impl Fn(&Achievement) -> bool,
) -> Result<Vec<AchievementView>, HandlerErr> {
    let achievements = state
        .store
        .list_achievements()?
        .into_iter()
        .filter(|a| filter(a))
        .collect();
    let students = state.store.list_students()?;
    let categories = state.store.achievement_categories()?;
    Ok(roster::achievement_views(achievements, &students, &categories))
}

fn achievements_categories(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({ "categories": state.store.achievement_categories()? }))
}

fn achievements_for_student(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let email = get_required_str(params, "email")?;
    let Some(student) = roster::student_by_email(state.store.as_ref(), &email)? else {
        return Ok(json!({ "achievements": [], "totalPoints": 0 }));
    };
    let list = views(state, |a| a.student_id == student.id)?;
    let total: i64 = list
        .iter()
        .filter(|v| v.achievement.status == AchievementStatus::Approved)
        .map(|v| v.achievement.points_awarded)
        .fold(0i64, |acc, p| acc.saturating_add(p));
    Ok(json!({ "achievements": list, "totalPoints": total }))
}

fn achievements_pending(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let year = get_year(params);
    let scope = roster::year_scope(year.as_deref());
    let list: Vec<AchievementView> = views(state, |a| a.status == AchievementStatus::Pending)?
        .into_iter()
        .filter(|v| scope.map_or(true, |y| v.student_year == y))
        .collect();
    Ok(json!({ "achievements": list }))
}

fn submitting_student(state: &AppState, params: &serde_json::Value) -> Result<Student, HandlerErr> {
    if let Some(id) = get_optional_i64(params, "studentId")? {
        return Ok(find_student(state.store.as_ref(), id)?);
    }
    let email = get_required_str(params, "email")?;
    roster::student_by_email(state.store.as_ref(), &email)?
        .ok_or_else(|| HandlerErr::not_found(format!("no student with email {}", email)))
}

fn achievements_submit(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student = submitting_student(state, params)?;
    let new = NewAchievement {
        student_id: student.id,
        category_id: get_required_i64(params, "categoryId")?,
        title: get_required_str(params, "title")?,
        description: get_optional_str(params, "description").unwrap_or_default(),
        proof_file: get_optional_str(params, "proofFile").unwrap_or_default(),
        achievement_date: get_optional_str(params, "achievementDate").unwrap_or_else(today),
        uploaded_at: today(),
    };
    let created = state.store.insert_achievement(new)?;
    tracing::info!(id = created.id, roll = %student.roll_no, "achievement submitted");
    let id = created.id;
    let view = views(state, |a| a.id == id)?.into_iter().next();
    Ok(json!({ "achievement": view }))
}

/// Approval without explicit points awards the category's points; rejection
/// always resets points to zero.
fn achievements_verify(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_i64(params, "id")?;
    let status: AchievementStatus = parse_enum(params, "status")?;
    if status == AchievementStatus::Pending {
        return Err(HandlerErr::bad_params("status must be approved or rejected"));
    }
    let achievement = state
        .store
        .list_achievements()?
        .into_iter()
        .find(|a| a.id == id)
        .ok_or_else(|| HandlerErr::not_found(format!("achievement {} not found", id)))?;

    let points_awarded = match status {
        AchievementStatus::Approved => match get_optional_i64(params, "points")? {
            Some(p) if p < 0 => return Err(HandlerErr::bad_params("points must not be negative")),
            Some(p) => p,
            None => state
                .store
                .achievement_categories()?
                .iter()
                .find(|c| c.id == achievement.category_id)
                .map(|c| c.points)
                .unwrap_or(0),
        },
        _ => 0,
    };
    let rejection_reason = match status {
        AchievementStatus::Rejected => get_optional_str(params, "rejectionReason"),
        _ => None,
    };
    let review = AchievementReview {
        status,
        points_awarded,
        rejection_reason,
    };
    if !state.store.review_achievement(id, &review)? {
        return Err(HandlerErr::not_found(format!("achievement {} not found", id)));
    }
    tracing::info!(id, status = status.as_str(), points_awarded, "achievement reviewed");
    let view = views(state, |a| a.id == id)?.into_iter().next();
    Ok(json!({ "achievement": view }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "achievements.categories" => achievements_categories(state),
        "achievements.forStudent" => achievements_for_student(state, &req.params),
        "achievements.pending" => achievements_pending(state, &req.params),
        "achievements.submit" => achievements_submit(state, &req.params),
        "achievements.verify" => achievements_verify(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
