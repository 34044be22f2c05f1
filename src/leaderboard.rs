use crate::model::{Achievement, AchievementStatus, MarkRecord, Student, StudentSubjectMark};
use crate::roster;
use crate::store::{Store, StoreResult};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub student_name: String,
    pub roll_no: String,
    pub total_points: f64,
    pub year_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Marks,
    Achievements,
}

impl Metric {
    pub fn parse(s: &str) -> Option<Metric> {
        match s.trim().to_ascii_lowercase().as_str() {
            "marks" | "academic" => Some(Metric::Marks),
            "achievements" | "points" => Some(Metric::Achievements),
            _ => None,
        }
    }
}

/// Orders by descending score and numbers positions from 1. The sort is
/// stable, so equal scores keep their input order.
pub fn rank_by<T, F>(items: Vec<T>, score: F) -> Vec<(usize, T)>
where
    F: Fn(&T) -> f64,
{
    let mut scored: Vec<(f64, T)> = items.into_iter().map(|t| (score(&t), t)).collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored
        .into_iter()
        .enumerate()
        .map(|(i, (_, t))| (i + 1, t))
        .collect()
}

fn year_level(student: &Student) -> String {
    student
        .year
        .clone()
        .filter(|y| !y.trim().is_empty())
        .unwrap_or_else(|| "1".to_string())
}

fn rank_students(students: &[Student], totals: &HashMap<i64, f64>) -> Vec<LeaderboardEntry> {
    let rows: Vec<(&Student, f64)> = students
        .iter()
        .map(|s| (s, totals.get(&s.id).copied().unwrap_or(0.0)))
        .collect();
    rank_by(rows, |(_, total)| *total)
        .into_iter()
        .map(|(rank, (s, total))| LeaderboardEntry {
            rank,
            student_name: s.name.clone(),
            roll_no: s.roll_no.clone(),
            total_points: total,
            year_level: year_level(s),
        })
        .collect()
}

/// Sum of every subject total the student has on record.
pub fn academic_leaderboard(students: &[Student], marks: &[MarkRecord]) -> Vec<LeaderboardEntry> {
    let mut totals: HashMap<i64, f64> = HashMap::new();
    for m in marks {
        *totals.entry(m.student_id).or_insert(0.0) += m.total();
    }
    rank_students(students, &totals)
}

/// Sum of awarded points over approved achievements only.
pub fn achievement_leaderboard(
    students: &[Student],
    achievements: &[Achievement],
) -> Vec<LeaderboardEntry> {
    let mut totals: HashMap<i64, f64> = HashMap::new();
    for a in achievements
        .iter()
        .filter(|a| a.status == AchievementStatus::Approved)
    {
        *totals.entry(a.student_id).or_insert(0.0) += a.points_awarded as f64;
    }
    rank_students(students, &totals)
}

pub fn subject_leaderboard(marks: Vec<StudentSubjectMark>) -> Vec<LeaderboardEntry> {
    rank_by(marks, |m| m.total)
        .into_iter()
        .map(|(rank, m)| LeaderboardEntry {
            rank,
            student_name: m.student_name,
            roll_no: m.roll_no,
            total_points: m.total,
            year_level: "N/A".to_string(),
        })
        .collect()
}

/// Filters the roster to `year` first, then ranks, so ranks always run 1..=n
/// within the requested cohort.
pub fn department_board(
    store: &dyn Store,
    metric: Metric,
    year: Option<&str>,
) -> StoreResult<Vec<LeaderboardEntry>> {
    let students = roster::students_in_scope(store.list_students()?, year);
    Ok(match metric {
        Metric::Marks => academic_leaderboard(&students, &store.list_marks()?),
        Metric::Achievements => achievement_leaderboard(&students, &store.list_achievements()?),
    })
}
