use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "HOD")]
    Hod,
    Admin,
    Staff,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Hod => "HOD",
            Role::Admin => "Admin",
            Role::Staff => "Staff",
            Role::Student => "Student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hod" => Ok(Role::Hod),
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            "student" => Ok(Role::Student),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub year: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub year: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub roll_no: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    pub internal1: f64,
    pub internal2: f64,
    pub attendance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cgpa: Option<f64>,
}

impl Student {
    pub fn in_year(&self, year: &str) -> bool {
        self.year.as_deref() == Some(year)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub roll_no: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub internal1: f64,
    #[serde(default)]
    pub internal2: f64,
    #[serde(default)]
    pub attendance: f64,
    #[serde(default)]
    pub cgpa: Option<f64>,
}

/// Partial update for a student. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub roll_no: Option<String>,
    pub year: Option<String>,
    pub internal1: Option<f64>,
    pub internal2: Option<f64>,
    pub attendance: Option<f64>,
    pub cgpa: Option<f64>,
}

impl StudentPatch {
    pub fn is_empty(&self) -> bool {
        *self == StudentPatch::default()
    }

    pub fn apply(&self, s: &mut Student) {
        if let Some(v) = &self.name {
            s.name = v.clone();
        }
        if let Some(v) = &self.email {
            s.email = Some(v.clone());
        }
        if let Some(v) = &self.roll_no {
            s.roll_no = v.clone();
        }
        if let Some(v) = &self.year {
            s.year = Some(v.clone());
        }
        if let Some(v) = self.internal1 {
            s.internal1 = v;
        }
        if let Some(v) = self.internal2 {
            s.internal2 = v;
        }
        if let Some(v) = self.attendance {
            s.attendance = v;
        }
        if let Some(v) = self.cgpa {
            s.cgpa = Some(v);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub year: String,
    pub staff_id: i64,
    pub staff_name: String,
    pub total_students: i64,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSubject {
    pub name: String,
    pub code: String,
    pub year: String,
    pub staff_id: i64,
    pub staff_name: String,
    pub total_students: i64,
    pub last_updated: String,
}

pub const MARK_MAX_TOTAL: f64 = 100.0;

/// Stored per (student, subject) pair. Names are joined in at read time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkRecord {
    pub student_id: i64,
    pub subject_id: i64,
    pub test1: f64,
    pub test2: f64,
    pub assignment: f64,
}

impl MarkRecord {
    pub fn blank(student_id: i64, subject_id: i64) -> Self {
        Self {
            student_id,
            subject_id,
            test1: 0.0,
            test2: 0.0,
            assignment: 0.0,
        }
    }

    pub fn total(&self) -> f64 {
        self.test1 + self.test2 + self.assignment
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSubjectMark {
    pub student_id: i64,
    pub student_name: String,
    pub roll_no: String,
    pub subject_id: i64,
    pub subject_name: String,
    pub test1: f64,
    pub test2: f64,
    pub assignment: f64,
    pub total: f64,
    pub max_total: f64,
}

impl StudentSubjectMark {
    pub fn recompute_total(&mut self) {
        self.total = self.test1 + self.test2 + self.assignment;
    }

    pub fn record(&self) -> MarkRecord {
        MarkRecord {
            student_id: self.student_id,
            subject_id: self.subject_id,
            test1: self.test1,
            test2: self.test2,
            assignment: self.assignment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "Pending",
            ReviewStatus::Approved => "Approved",
            ReviewStatus::Rejected => "Rejected",
        }
    }
}

impl FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ReviewStatus::Pending),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: i64,
    pub student_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub company: String,
    pub status: ReviewStatus,
    pub upload_date: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCertificate {
    pub student_name: String,
    pub kind: String,
    pub company: String,
    pub status: ReviewStatus,
    pub upload_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveApplication {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub roll_no: String,
    pub leave_date: String,
    pub reason: String,
    pub status: ReviewStatus,
    pub applied_on: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLeave {
    pub student_id: i64,
    pub student_name: String,
    pub roll_no: String,
    pub leave_date: String,
    pub reason: String,
    pub applied_on: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementStatus {
    Pending,
    Approved,
    Rejected,
}

impl AchievementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementStatus::Pending => "pending",
            AchievementStatus::Approved => "approved",
            AchievementStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for AchievementStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(AchievementStatus::Pending),
            "approved" => Ok(AchievementStatus::Approved),
            "rejected" => Ok(AchievementStatus::Rejected),
            other => Err(format!("unknown achievement status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementCategory {
    pub id: i64,
    pub category_name: String,
    pub points: i64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: i64,
    pub student_id: i64,
    pub category_id: i64,
    pub title: String,
    pub description: String,
    pub proof_file: String,
    pub achievement_date: String,
    pub points_awarded: i64,
    pub status: AchievementStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub uploaded_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAchievement {
    pub student_id: i64,
    pub category_id: i64,
    pub title: String,
    pub description: String,
    pub proof_file: String,
    pub achievement_date: String,
    pub uploaded_at: String,
}

/// Review decision applied to a submitted achievement.
#[derive(Debug, Clone, PartialEq)]
pub struct AchievementReview {
    pub status: AchievementStatus,
    pub points_awarded: i64,
    pub rejection_reason: Option<String>,
}
