use crate::model::{Achievement, AchievementStatus, Student, StudentSubjectMark};
use serde::Serialize;

pub const PASS_MARK: f64 = 50.0;
pub const ATTENDANCE_THRESHOLD: f64 = 75.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PassFail {
    pub pass: usize,
    pub fail: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSplit {
    pub above75: usize,
    pub below75: usize,
    pub average_attendance: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CgpaBuckets {
    pub a_plus: usize,
    pub a: usize,
    pub b_plus: usize,
    pub b: usize,
    pub c: usize,
    pub f: usize,
}

impl CgpaBuckets {
    pub fn add(&mut self, cgpa: f64) {
        match cgpa {
            v if v >= 9.0 => self.a_plus += 1,
            v if v >= 8.0 => self.a += 1,
            v if v >= 7.0 => self.b_plus += 1,
            v if v >= 6.0 => self.b += 1,
            v if v >= 5.0 => self.c += 1,
            _ => self.f += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyStats {
    pub year: String,
    pub total_students: usize,
    pub internal1: PassFail,
    pub internal2: PassFail,
    pub attendance: AttendanceSplit,
    pub cgpa: CgpaBuckets,
    pub pass_rate: u32,
    pub internships_completed: usize,
    pub at_risk: Vec<String>,
}

fn pass_fail(values: impl Iterator<Item = f64>) -> PassFail {
    let mut out = PassFail::default();
    for v in values {
        if v >= PASS_MARK {
            out.pass += 1;
        } else {
            out.fail += 1;
        }
    }
    out
}

/// Whole percentage of `part` in `whole`, 0 for an empty population.
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

pub fn is_at_risk(s: &Student) -> bool {
    s.attendance < ATTENDANCE_THRESHOLD || s.internal1 < PASS_MARK
}

pub fn average_marks(s: &Student) -> f64 {
    ((s.internal1 + s.internal2) / 2.0).round()
}

/// Aggregates one year's cohort. `students` must already be limited to that year;
/// `achievements` may span every year.
pub fn yearly_stats(
    year: &str,
    students: &[Student],
    achievements: &[Achievement],
    internship_category_id: i64,
) -> YearlyStats {
    let internal1 = pass_fail(students.iter().map(|s| s.internal1));
    let internal2 = pass_fail(students.iter().map(|s| s.internal2));

    let mut attendance = AttendanceSplit::default();
    for s in students {
        if s.attendance >= ATTENDANCE_THRESHOLD {
            attendance.above75 += 1;
        } else {
            attendance.below75 += 1;
        }
    }
    if !students.is_empty() {
        let sum: f64 = students.iter().map(|s| s.attendance).sum();
        attendance.average_attendance = (sum / students.len() as f64 * 10.0).round() / 10.0;
    }

    let mut cgpa = CgpaBuckets::default();
    for v in students.iter().filter_map(|s| s.cgpa) {
        cgpa.add(v);
    }

    let internships_completed = achievements
        .iter()
        .filter(|a| a.status == AchievementStatus::Approved)
        .filter(|a| a.category_id == internship_category_id)
        .filter(|a| students.iter().any(|s| s.id == a.student_id))
        .count();

    YearlyStats {
        year: year.to_string(),
        total_students: students.len(),
        internal1,
        internal2,
        attendance,
        cgpa,
        pass_rate: percent(internal2.pass, students.len()),
        internships_completed,
        at_risk: students
            .iter()
            .filter(|s| is_at_risk(s))
            .map(|s| s.roll_no.clone())
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStats {
    pub subject_id: i64,
    pub students: usize,
    pub pass_count: usize,
    pub pass_percent: u32,
    pub class_average: f64,
}

pub fn subject_stats(subject_id: i64, sheet: &[StudentSubjectMark]) -> SubjectStats {
    let pass_count = sheet.iter().filter(|m| m.total >= PASS_MARK).count();
    let class_average = if sheet.is_empty() {
        0.0
    } else {
        let sum: f64 = sheet.iter().map(|m| m.total).sum();
        (sum / sheet.len() as f64 * 10.0).round() / 10.0
    };
    SubjectStats {
        subject_id,
        students: sheet.len(),
        pass_count,
        pass_percent: percent(pass_count, sheet.len()),
        class_average,
    }
}
