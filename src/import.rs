//! Reconciles uploaded spreadsheet rows against the roster by roll number.
//!
//! Rows are loosely typed: the same column may arrive under several header
//! spellings, and values may be JSON numbers or text. Matching rows overwrite
//! only the fields they carry; everything else keeps its prior value.

use crate::model::{Student, StudentSubjectMark};
use anyhow::Context;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

pub type Row = Map<String, Value>;

pub const ROLL_ALIASES: &[&str] = &["roll_no", "Roll No", "rollNo", "Roll_No"];
pub const TEST1_ALIASES: &[&str] = &["test1", "Test 1"];
pub const TEST2_ALIASES: &[&str] = &["test2", "Test 2"];
pub const ASSIGNMENT_ALIASES: &[&str] = &["assignment", "Assignment"];
pub const ATTENDANCE_ALIASES: &[&str] = &["attendance", "Attendance", "Attendance %", "attendance %"];

/// How attendance cells are expressed in the uploaded sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AttendanceFormat {
    /// Plain numbers in (0, 1] are read as fractions, anything else as a percentage.
    #[default]
    Infer,
    Percent,
    Fraction,
}

impl AttendanceFormat {
    pub fn parse(s: &str) -> Option<AttendanceFormat> {
        match s.trim().to_ascii_lowercase().as_str() {
            "infer" | "auto" => Some(AttendanceFormat::Infer),
            "percent" | "percentage" => Some(AttendanceFormat::Percent),
            "fraction" | "decimal" => Some(AttendanceFormat::Fraction),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome<T> {
    pub records: Vec<T>,
    pub updated: usize,
    pub skipped: usize,
}

fn non_blank(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// First alias whose cell holds something.
pub fn cell<'a>(row: &'a Row, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|k| row.get(*k))
        .find(|v| non_blank(v))
}

pub fn roll_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i.to_string()),
            None => n.as_f64().map(|f| f.to_string()),
        },
        _ => None,
    }
}

pub fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Converts an attendance cell to a whole percentage in [0, 100].
pub fn coerce_attendance(raw: &Value, format: AttendanceFormat) -> Option<f64> {
    let (value, percent_suffix) = match raw {
        Value::Number(n) => (n.as_f64()?, false),
        Value::String(s) => {
            let t = s.trim();
            match t.strip_suffix('%') {
                Some(head) => (head.trim().parse::<f64>().ok()?, true),
                None => (t.parse::<f64>().ok()?, false),
            }
        }
        _ => return None,
    };
    if !value.is_finite() {
        return None;
    }
    let scaled = match format {
        AttendanceFormat::Percent => value,
        AttendanceFormat::Fraction => value * 100.0,
        AttendanceFormat::Infer if !percent_suffix && value > 0.0 && value <= 1.0 => value * 100.0,
        AttendanceFormat::Infer => value,
    };
    Some(scaled.round().clamp(0.0, 100.0))
}

pub fn reconcile_marks(
    mut sheet: Vec<StudentSubjectMark>,
    rows: &[Row],
) -> ImportOutcome<StudentSubjectMark> {
    let mut updated = 0usize;
    let mut skipped = 0usize;
    for row in rows {
        let Some(roll) = cell(row, ROLL_ALIASES).and_then(roll_text) else {
            skipped += 1;
            continue;
        };
        let Some(target) = sheet.iter_mut().find(|m| m.roll_no == roll) else {
            skipped += 1;
            continue;
        };
        if let Some(v) = cell(row, TEST1_ALIASES).and_then(numeric) {
            target.test1 = v;
        }
        if let Some(v) = cell(row, TEST2_ALIASES).and_then(numeric) {
            target.test2 = v;
        }
        if let Some(v) = cell(row, ASSIGNMENT_ALIASES).and_then(numeric) {
            target.assignment = v;
        }
        target.recompute_total();
        updated += 1;
    }
    ImportOutcome {
        records: sheet,
        updated,
        skipped,
    }
}

pub fn reconcile_attendance(
    mut students: Vec<Student>,
    rows: &[Row],
    format: AttendanceFormat,
) -> ImportOutcome<Student> {
    let mut updated = 0usize;
    let mut skipped = 0usize;
    for row in rows {
        let roll = cell(row, ROLL_ALIASES).and_then(roll_text);
        let value = cell(row, ATTENDANCE_ALIASES).and_then(|v| coerce_attendance(v, format));
        let (Some(roll), Some(value)) = (roll, value) else {
            skipped += 1;
            continue;
        };
        let Some(target) = students.iter_mut().find(|s| s.roll_no == roll) else {
            skipped += 1;
            continue;
        };
        target.attendance = value;
        updated += 1;
    }
    ImportOutcome {
        records: students,
        updated,
        skipped,
    }
}

/// Reads the first sheet of a CSV export. Header cells become keys; cells
/// stay text and are coerced per field during reconciliation. Blank cells
/// are left out of the row.
pub fn read_csv_rows(path: &Path) -> anyhow::Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.to_string_lossy()))?;
    let headers: Vec<String> = reader
        .headers()
        .context("failed to read header row")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("malformed row {}", i + 2))?;
        let mut row = Row::new();
        for (key, field) in headers.iter().zip(record.iter()) {
            if key.is_empty() || field.is_empty() {
                continue;
            }
            row.insert(key.clone(), Value::String(field.to_string()));
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Accepts `[{...}, ...]`; non-object entries are dropped.
pub fn rows_from_json(v: &Value) -> Option<Vec<Row>> {
    let arr = v.as_array()?;
    Some(
        arr.iter()
            .filter_map(|r| r.as_object().cloned())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Row {
        v.as_object().cloned().expect("object row")
    }

    fn sheet_row(roll: &str, test1: f64, test2: f64, assignment: f64) -> StudentSubjectMark {
        StudentSubjectMark {
            student_id: 1,
            student_name: roll.to_string(),
            roll_no: roll.to_string(),
            subject_id: 1,
            subject_name: "Maths".to_string(),
            test1,
            test2,
            assignment,
            total: test1 + test2 + assignment,
            max_total: 100.0,
        }
    }

    fn roster_student(roll: &str, attendance: f64) -> Student {
        Student {
            id: 1,
            name: roll.to_string(),
            email: None,
            roll_no: roll.to_string(),
            year: Some("1".to_string()),
            internal1: 0.0,
            internal2: 0.0,
            attendance,
            cgpa: None,
        }
    }

    #[test]
    fn unknown_roll_is_skipped_without_mutation() {
        let sheet = vec![sheet_row("CS101", 45.0, 48.0, 10.0)];
        let out = reconcile_marks(sheet.clone(), &[row(json!({"roll_no": "ZZ999", "test1": 1}))]);
        assert_eq!(out.updated, 0);
        assert_eq!(out.skipped, 1);
        assert_eq!(out.records, sheet);
    }

    #[test]
    fn partial_row_keeps_other_components_and_recomputes_total() {
        let sheet = vec![sheet_row("CS101", 45.0, 48.0, 10.0)];
        let out = reconcile_marks(sheet, &[row(json!({"Roll No": "CS101", "Test 1": "30"}))]);
        assert_eq!(out.updated, 1);
        let m = &out.records[0];
        assert_eq!(m.test1, 30.0);
        assert_eq!(m.test2, 48.0);
        assert_eq!(m.assignment, 10.0);
        assert_eq!(m.total, 88.0);
    }

    #[test]
    fn zero_is_a_present_value() {
        let sheet = vec![sheet_row("CS101", 45.0, 48.0, 10.0)];
        let out = reconcile_marks(sheet, &[row(json!({"roll_no": "CS101", "assignment": 0}))]);
        assert_eq!(out.records[0].assignment, 0.0);
        assert_eq!(out.records[0].total, 93.0);
    }

    #[test]
    fn blank_alias_falls_through_to_next_spelling() {
        let sheet = vec![sheet_row("101", 0.0, 0.0, 0.0)];
        let out = reconcile_marks(
            sheet,
            &[row(json!({"roll_no": "", "Roll No": 101, "test2": 12.5}))],
        );
        assert_eq!(out.updated, 1);
        assert_eq!(out.records[0].test2, 12.5);
    }

    #[test]
    fn attendance_heuristic_and_clamping() {
        let infer = AttendanceFormat::Infer;
        assert_eq!(coerce_attendance(&json!(0.92), infer), Some(92.0));
        assert_eq!(coerce_attendance(&json!("0.92"), infer), Some(92.0));
        assert_eq!(coerce_attendance(&json!(92), infer), Some(92.0));
        assert_eq!(coerce_attendance(&json!(1), infer), Some(100.0));
        assert_eq!(coerce_attendance(&json!(150), infer), Some(100.0));
        assert_eq!(coerce_attendance(&json!(-4), infer), Some(0.0));
        assert_eq!(coerce_attendance(&json!("0.5%"), infer), Some(1.0));
        assert_eq!(coerce_attendance(&json!("87.6 %"), infer), Some(88.0));
        assert_eq!(coerce_attendance(&json!("n/a"), infer), None);
    }

    #[test]
    fn declared_formats_override_inference() {
        assert_eq!(coerce_attendance(&json!(0.92), AttendanceFormat::Percent), Some(1.0));
        assert_eq!(coerce_attendance(&json!(0.5), AttendanceFormat::Fraction), Some(50.0));
        assert_eq!(coerce_attendance(&json!(1.2), AttendanceFormat::Fraction), Some(100.0));
    }

    #[test]
    fn attendance_rows_need_roll_and_value() {
        let roster = vec![roster_student("CS101", 50.0), roster_student("CS102", 60.0)];
        let rows = vec![
            row(json!({"Roll_No": "CS101", "Attendance %": 0.9})),
            row(json!({"rollNo": "CS102"})),
            row(json!({"roll_no": "CS999", "attendance": 80})),
        ];
        let out = reconcile_attendance(roster, &rows, AttendanceFormat::Infer);
        assert_eq!(out.updated, 1);
        assert_eq!(out.skipped, 2);
        assert_eq!(out.records[0].attendance, 90.0);
        assert_eq!(out.records[1].attendance, 60.0);
    }

    #[test]
    fn csv_rows_keep_text_and_drop_blank_cells() {
        let dir = std::env::temp_dir().join(format!("deptd-import-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("dir");
        let path = dir.join("marks.csv");
        std::fs::write(&path, "Roll No,Test 1,Test 2\nCS101,40,\n,,\nCS102, 33 ,20\n").expect("write");

        let rows = read_csv_rows(&path).expect("read");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Roll No"), Some(&json!("CS101")));
        assert!(rows[0].get("Test 2").is_none());
        assert_eq!(rows[1].get("Test 1"), Some(&json!("33")));

        let _ = std::fs::remove_dir_all(dir);
    }
}
