mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, request_with_events, spawn_sidecar_with};

#[test]
fn settings_update_pushes_event_before_response() {
    let (_child, mut stdin, mut reader) =
        spawn_sidecar_with(&[("DEPTD_INSTITUTION_NAME", "Kongu Engineering")]);

    let current = request_ok(&mut stdin, &mut reader, "1", "settings.get", json!({}));
    assert_eq!(current["settings"]["institutionName"], "Kongu Engineering");
    assert!(current["settings"]["logoUrl"].is_null());

    let (events, resp) = request_with_events(
        &mut stdin,
        &mut reader,
        "2",
        "settings.update",
        json!({ "logoUrl": "https://cdn.example/logo.png" }),
    );
    assert_eq!(resp["ok"], true);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event"], "settings.changed");
    assert_eq!(events[0]["payload"]["logoUrl"], "https://cdn.example/logo.png");
    assert_eq!(events[0]["payload"]["institutionName"], "Kongu Engineering");

    let (events, _) = request_with_events(&mut stdin, &mut reader, "3", "settings.get", json!({}));
    assert!(events.is_empty());

    let (events, resp) = request_with_events(
        &mut stdin,
        &mut reader,
        "4",
        "settings.update",
        json!({ "logoUrl": null }),
    );
    assert_eq!(events.len(), 1);
    assert!(resp["result"]["settings"]["logoUrl"].is_null());

    let code = request_err(&mut stdin, &mut reader, "5", "settings.update", json!({}));
    assert_eq!(code, "bad_params");
}
