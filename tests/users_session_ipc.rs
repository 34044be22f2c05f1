mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar};

#[test]
fn login_prefers_directory_then_demo_inference() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let staff = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "session.login",
        json!({ "email": "rajesh@college.edu" }),
    );
    assert_eq!(staff["role"], "Staff");
    assert_eq!(staff["source"], "directory");
    assert_eq!(staff["user"]["name"], "Dr. Rajesh Kumar");

    let hod = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "session.login",
        json!({ "email": "hod@college.edu" }),
    );
    assert_eq!(hod["role"], "HOD");
    assert_eq!(hod["source"], "demo");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "session.login",
        json!({ "email": "visitor@example.org" }),
    );
    assert_eq!(code, "user_not_found");
}

#[test]
fn users_create_lookup_and_delete() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "users.create",
        json!({
            "name": "Office Admin",
            "email": "office@college.edu",
            "role": "admin",
        }),
    );
    let id = created["user"]["id"].as_i64().expect("id");
    assert_eq!(created["user"]["role"], "Admin");
    assert_eq!(created["user"]["subject"], "-");

    let role = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "users.roleByEmail",
        json!({ "email": "office@college.edu" }),
    );
    assert_eq!(role["role"], "Admin");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "users.create",
        json!({ "name": "X", "email": "x@y", "role": "janitor" }),
    );
    assert_eq!(code, "bad_params");

    let _ = request_ok(&mut stdin, &mut reader, "4", "users.delete", json!({ "id": id }));
    let users = request_ok(&mut stdin, &mut reader, "5", "users.list", json!({}));
    assert_eq!(users["users"].as_array().map(|a| a.len()), Some(5));

    let code = request_err(&mut stdin, &mut reader, "6", "users.delete", json!({ "id": id }));
    assert_eq!(code, "not_found");

    let missing = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "users.roleByEmail",
        json!({ "email": "office@college.edu" }),
    );
    assert!(missing["role"].is_null());
}

#[test]
fn student_profile_falls_back_to_directory_account() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let enrolled = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.profile",
        json!({ "email": "arun@student.edu" }),
    );
    assert_eq!(enrolled["profile"]["rollNo"], "CS101");
    assert_eq!(enrolled["profile"]["enrolled"], true);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "users.create",
        json!({ "name": "Late Joiner", "email": "late@student.edu", "role": "Student", "year": "3" }),
    );
    let synthetic = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.profile",
        json!({ "email": "late@student.edu" }),
    );
    assert_eq!(synthetic["profile"]["enrolled"], false);
    assert_eq!(synthetic["profile"]["rollNo"], "N/A");
    assert_eq!(synthetic["profile"]["year"], "3");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "students.profile",
        json!({ "email": "ghost@student.edu" }),
    );
    assert_eq!(code, "not_found");
}
