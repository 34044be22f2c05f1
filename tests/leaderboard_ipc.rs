mod test_support;

use serde_json::json;
use test_support::{request_ok, spawn_sidecar};

fn entries(v: &serde_json::Value) -> Vec<serde_json::Value> {
    v["entries"].as_array().cloned().expect("entries")
}

#[test]
fn marks_leaderboard_ranks_within_the_requested_year() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let year1 = entries(&request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "leaderboard.marks",
        json!({ "year": "1" }),
    ));
    assert_eq!(year1.len(), 5);
    assert_eq!(year1[0]["rollNo"], "CS101");
    assert_eq!(year1[0]["totalPoints"], 281.0);
    assert_eq!(year1[1]["rollNo"], "CS102");
    assert_eq!(year1[1]["totalPoints"], 174.0);
    for (i, e) in year1.iter().enumerate() {
        assert_eq!(e["rank"], i as u64 + 1);
        assert_eq!(e["yearLevel"], "1");
    }
    // Zero scores keep roster order.
    let tail: Vec<&str> = year1[2..].iter().filter_map(|e| e["rollNo"].as_str()).collect();
    assert_eq!(tail, vec!["CS103", "CS104", "CS105"]);

    let all = entries(&request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "leaderboard.marks",
        json!({ "year": "All" }),
    ));
    assert_eq!(all.len(), 12);
    let filtered: Vec<&str> = all
        .iter()
        .filter(|e| e["yearLevel"] == "1")
        .filter_map(|e| e["rollNo"].as_str())
        .collect();
    let direct: Vec<&str> = year1.iter().filter_map(|e| e["rollNo"].as_str()).collect();
    assert_eq!(filtered, direct);
    for w in all.windows(2) {
        assert!(w[0]["totalPoints"].as_f64() >= w[1]["totalPoints"].as_f64());
    }
}

#[test]
fn achievements_leaderboard_counts_approved_points_only() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let board = entries(&request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "leaderboard.achievements",
        json!({}),
    ));
    assert_eq!(board[0]["rollNo"], "CS101");
    assert_eq!(board[0]["totalPoints"], 20.0);
    assert_eq!(board[1]["rollNo"], "CS102");
    assert_eq!(board[1]["totalPoints"], 15.0);

    let empty_year = entries(&request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "leaderboard.achievements",
        json!({ "year": "7" }),
    ));
    assert!(empty_year.is_empty());
}
