use crate::ipc::helpers::{
    get_optional_str, get_required_i64, get_required_str, parse_enum, respond, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{NewUser, Role};
use serde_json::json;

/// Role guessed from a demo address when the directory has no such account.
pub fn demo_role(email: &str) -> Option<Role> {
    let e = email.to_ascii_lowercase();
    if e.contains("hod") {
        Some(Role::Hod)
    } else if e.contains("admin") {
        Some(Role::Admin)
    } else if e.contains("staff") || e.contains("prof") || e.contains("dr.") {
        Some(Role::Staff)
    } else if e.contains("student") {
        Some(Role::Student)
    } else {
        None
    }
}

fn session_login(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let email = get_required_str(params, "email")?;
    if let Some(user) = state.store.find_user_by_email(&email)? {
        tracing::info!(email = %email, role = %user.role, "login from directory");
        return Ok(json!({
            "email": email,
            "role": user.role,
            "source": "directory",
            "user": user,
        }));
    }
    match demo_role(&email) {
        Some(role) => {
            tracing::info!(email = %email, role = %role, "demo login");
            Ok(json!({
                "email": email,
                "role": role,
                "source": "demo",
                "user": null,
            }))
        }
        None => Err(HandlerErr::new(
            "user_not_found",
            "User not found. Try a demo email.",
        )),
    }
}

fn users_list(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({ "users": state.store.list_users()? }))
}

fn users_create(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let user = NewUser {
        name: get_required_str(params, "name")?,
        email: get_required_str(params, "email")?,
        role: parse_enum::<Role>(params, "role")?,
        year: get_optional_str(params, "year").unwrap_or_default(),
        subject: get_optional_str(params, "subject").unwrap_or_else(|| "-".to_string()),
    };
    let created = state.store.create_user(user)?;
    Ok(json!({ "user": created }))
}

fn users_delete(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_i64(params, "id")?;
    if !state.store.delete_user(id)? {
        return Err(HandlerErr::not_found(format!("user {} not found", id)));
    }
    Ok(json!({ "deleted": id }))
}

fn users_role_by_email(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let email = get_required_str(params, "email")?;
    let role = state.store.find_user_by_email(&email)?.map(|u| u.role);
    Ok(json!({ "role": role }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "session.login" => session_login(state, &req.params),
        "users.list" => users_list(state),
        "users.create" => users_create(state, &req.params),
        "users.delete" => users_delete(state, &req.params),
        "users.roleByEmail" => users_role_by_email(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
