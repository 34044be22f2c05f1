mod test_support;

use serde_json::json;
use test_support::{find_by, request_err, request_ok, spawn_sidecar};

#[test]
fn leave_application_review_flow() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let applied = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "leaves.apply",
        json!({ "email": "arun@student.edu", "leaveDate": "2025-02-03", "reason": "Medical" }),
    );
    let leave = &applied["leave"];
    assert_eq!(leave["status"], "Pending");
    assert_eq!(leave["rollNo"], "CS101");
    assert_eq!(leave["studentName"], "Arun Kumar");
    let id = leave["id"].as_i64().expect("id");

    let year1 = request_ok(&mut stdin, &mut reader, "2", "leaves.pending", json!({ "year": "1" }));
    assert_eq!(year1["leaves"].as_array().map(|a| a.len()), Some(1));
    let year2 = request_ok(&mut stdin, &mut reader, "3", "leaves.pending", json!({ "year": "2" }));
    assert_eq!(year2["leaves"], json!([]));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "leaves.setStatus",
        json!({ "id": id, "status": "Approved" }),
    );
    let pending = request_ok(&mut stdin, &mut reader, "5", "leaves.pending", json!({}));
    assert_eq!(pending["leaves"], json!([]));

    let mine = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "leaves.forStudent",
        json!({ "email": "arun@student.edu" }),
    );
    assert_eq!(mine["leaves"][0]["status"], "Approved");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "leaves.apply",
        json!({ "email": "ghost@student.edu", "leaveDate": "2025-02-03", "reason": "x" }),
    );
    assert_eq!(code, "not_found");
}

#[test]
fn certificates_are_newest_first_and_reviewable() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let listed = request_ok(&mut stdin, &mut reader, "1", "certificates.list", json!({}));
    let certs = listed["certificates"].as_array().expect("certificates");
    assert_eq!(certs.len(), 3);
    assert_eq!(certs[0]["company"], "Wipro");
    assert_eq!(certs[0]["type"], "Internship");

    let infosys = find_by(&listed["certificates"], "company", "Infosys");
    let id = infosys["id"].as_i64().expect("id");
    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "certificates.setStatus",
        json!({ "id": id, "status": "rejected" }),
    );
    assert_eq!(updated["status"], "Rejected");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "certificates.setStatus",
        json!({ "id": id, "status": "lost" }),
    );
    assert_eq!(code, "bad_params");
}
