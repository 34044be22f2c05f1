use crate::leaderboard::LeaderboardEntry;
use crate::model::Student;
use crate::stats::{average_marks, is_at_risk, YearlyStats};
use anyhow::Context;
use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
pub const WORKBOOK_FORMAT_V1: &str = "deptd-workbook-v1";

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    fn new(name: &str, headers: &[&str]) -> Sheet {
        Sheet {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSummary {
    pub name: String,
    pub entry: String,
    pub rows: usize,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookSummary {
    pub format: String,
    pub export_id: String,
    pub entry_count: usize,
    pub sheets: Vec<SheetSummary>,
}

/// `sheets/student-directory.csv` for "Student Directory".
pub fn sheet_entry_name(name: &str) -> String {
    let slug: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    format!("sheets/{}.csv", slug)
}

fn sheet_csv(sheet: &Sheet) -> anyhow::Result<Vec<u8>> {
    let mut w = csv::WriterBuilder::new().flexible(true).from_writer(Vec::new());
    w.write_record(&sheet.headers)
        .with_context(|| format!("failed to write header of sheet {}", sheet.name))?;
    for row in &sheet.rows {
        w.write_record(row)
            .with_context(|| format!("failed to write row of sheet {}", sheet.name))?;
    }
    w.into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush sheet {}: {}", sheet.name, e))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn write_workbook(out_path: &Path, sheets: &[Sheet]) -> anyhow::Result<WorkbookSummary> {
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory {}", parent.to_string_lossy())
            })?;
        }
    }

    let mut encoded = Vec::with_capacity(sheets.len());
    let mut summaries = Vec::with_capacity(sheets.len());
    for sheet in sheets {
        let bytes = sheet_csv(sheet)?;
        summaries.push(SheetSummary {
            name: sheet.name.clone(),
            entry: sheet_entry_name(&sheet.name),
            rows: sheet.rows.len(),
            sha256: sha256_hex(&bytes),
        });
        encoded.push(bytes);
    }

    let export_id = uuid::Uuid::new_v4().to_string();
    let manifest = json!({
        "format": WORKBOOK_FORMAT_V1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportId": export_id,
        "exportedAt": chrono::Utc::now().to_rfc3339(),
        "sheets": summaries,
    });

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    for (summary, bytes) in summaries.iter().zip(encoded.iter()) {
        zip.start_file(summary.entry.as_str(), opts)
            .with_context(|| format!("failed to start entry {}", summary.entry))?;
        zip.write_all(bytes)
            .with_context(|| format!("failed to write entry {}", summary.entry))?;
    }
    zip.finish().context("failed to finalize workbook")?;

    Ok(WorkbookSummary {
        format: WORKBOOK_FORMAT_V1.to_string(),
        export_id,
        entry_count: summaries.len() + 1,
        sheets: summaries,
    })
}

pub fn leaderboard_sheet(entries: &[LeaderboardEntry]) -> Sheet {
    let mut sheet = Sheet::new(
        "Leaderboard",
        &["Rank", "Student Name", "Roll No", "Year", "Total Points"],
    );
    for e in entries {
        sheet.rows.push(vec![
            e.rank.to_string(),
            e.student_name.clone(),
            e.roll_no.clone(),
            e.year_level.clone(),
            e.total_points.to_string(),
        ]);
    }
    sheet
}

/// Summary plus a student directory. The directory sheet is left out for an
/// empty cohort.
pub fn year_report_sheets(stats: &YearlyStats, students: &[Student]) -> Vec<Sheet> {
    let mut summary = Sheet::new("Summary", &["Metric", "Value"]);
    let metrics = [
        ("Year", stats.year.clone()),
        ("Total Students", stats.total_students.to_string()),
        ("Avg Attendance", format!("{}%", stats.attendance.average_attendance.round())),
        ("Pass Rate", format!("{}%", stats.pass_rate)),
        ("Completed Internships", stats.internships_completed.to_string()),
        ("At Risk", stats.at_risk.len().to_string()),
    ];
    for (metric, value) in metrics {
        summary.rows.push(vec![metric.to_string(), value]);
    }

    let mut sheets = vec![summary];
    if students.is_empty() {
        return sheets;
    }

    let mut directory = Sheet::new(
        "Student Directory",
        &[
            "Roll No",
            "Name",
            "Attendance %",
            "Internal 1",
            "Internal 2",
            "Avg Marks",
            "Status",
        ],
    );
    for s in students {
        directory.rows.push(vec![
            s.roll_no.clone(),
            s.name.clone(),
            s.attendance.to_string(),
            s.internal1.to_string(),
            s.internal2.to_string(),
            average_marks(s).to_string(),
            if is_at_risk(s) { "At Risk" } else { "Good" }.to_string(),
        ]);
    }
    sheets.push(directory);
    sheets
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("deptd-export-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn entry_names_are_slugged() {
        assert_eq!(sheet_entry_name("Student Directory"), "sheets/student-directory.csv");
        assert_eq!(sheet_entry_name("Leaderboard"), "sheets/leaderboard.csv");
    }

    #[test]
    fn manifest_checksums_match_entries() {
        let entries = vec![LeaderboardEntry {
            rank: 1,
            student_name: "Arun, K".to_string(),
            roll_no: "CS101".to_string(),
            total_points: 93.0,
            year_level: "1".to_string(),
        }];
        let out = temp_path("board.zip");
        let summary = write_workbook(&out, &[leaderboard_sheet(&entries)]).expect("write");
        assert_eq!(summary.entry_count, 2);

        let mut zip = ZipArchive::new(File::open(&out).expect("open")).expect("zip");
        let mut manifest = String::new();
        zip.by_name(MANIFEST_ENTRY)
            .expect("manifest")
            .read_to_string(&mut manifest)
            .expect("read manifest");
        let manifest: serde_json::Value = serde_json::from_str(&manifest).expect("json");
        assert_eq!(manifest["format"], WORKBOOK_FORMAT_V1);

        let mut body = Vec::new();
        zip.by_name("sheets/leaderboard.csv")
            .expect("sheet")
            .read_to_end(&mut body)
            .expect("read sheet");
        assert_eq!(manifest["sheets"][0]["sha256"], sha256_hex(&body));
        let text = String::from_utf8(body).expect("utf8");
        assert!(text.starts_with("Rank,Student Name,Roll No,Year,Total Points"));
        assert!(text.contains("1,\"Arun, K\",CS101,1,93"));

        if let Some(dir) = out.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn empty_cohort_has_summary_only() {
        let stats = crate::stats::yearly_stats("3", &[], &[], 6);
        let sheets = year_report_sheets(&stats, &[]);
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].rows[1], vec!["Total Students".to_string(), "0".to_string()]);
    }
}
