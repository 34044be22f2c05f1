mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::model::{
    Achievement, AchievementCategory, AchievementReview, Certificate, LeaveApplication,
    MarkRecord, NewAchievement, NewCertificate, NewLeave, NewStudent, NewSubject, NewUser,
    ReviewStatus, Student, StudentPatch, Subject, User,
};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("invalid record: {0}")]
    Invalid(String),
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "not_found",
            StoreError::Invalid(_) => "bad_params",
            StoreError::Sqlite(_) => "store_failed",
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Sqlite,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Memory => "memory",
            Backend::Sqlite => "sqlite",
        }
    }

    pub fn parse(s: &str) -> Option<Backend> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" | "mock" => Some(Backend::Memory),
            "sqlite" | "db" => Some(Backend::Sqlite),
            _ => None,
        }
    }
}

/// Table-oriented data access shared by the in-memory and SQLite backends.
///
/// Listing methods return records in ascending id order unless noted.
/// Mutations report whether a row was touched rather than failing on a
/// missing id, except where a caller needs the record back.
pub trait Store {
    fn backend(&self) -> Backend;

    fn list_users(&self) -> StoreResult<Vec<User>>;
    fn create_user(&mut self, user: NewUser) -> StoreResult<User>;
    fn delete_user(&mut self, id: i64) -> StoreResult<bool>;
    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    fn list_students(&self) -> StoreResult<Vec<Student>>;
    fn insert_student(&mut self, student: NewStudent) -> StoreResult<Student>;
    fn update_student(&mut self, id: i64, patch: &StudentPatch) -> StoreResult<bool>;

    fn list_subjects(&self) -> StoreResult<Vec<Subject>>;
    fn create_subject(&mut self, subject: NewSubject) -> StoreResult<Subject>;
    /// Removes the subject together with every mark recorded against it.
    fn delete_subject(&mut self, id: i64) -> StoreResult<bool>;
    fn touch_subject(&mut self, id: i64, date: &str) -> StoreResult<bool>;

    fn list_marks(&self) -> StoreResult<Vec<MarkRecord>>;
    /// Inserts or replaces marks keyed by (student, subject). Returns rows written.
    fn upsert_marks(&mut self, marks: &[MarkRecord]) -> StoreResult<usize>;

    /// Newest first.
    fn list_certificates(&self) -> StoreResult<Vec<Certificate>>;
    fn insert_certificate(&mut self, certificate: NewCertificate) -> StoreResult<Certificate>;
    fn set_certificate_status(&mut self, id: i64, status: ReviewStatus) -> StoreResult<bool>;

    fn achievement_categories(&self) -> StoreResult<Vec<AchievementCategory>>;
    /// Newest first.
    fn list_achievements(&self) -> StoreResult<Vec<Achievement>>;
    fn insert_achievement(&mut self, achievement: NewAchievement) -> StoreResult<Achievement>;
    fn review_achievement(&mut self, id: i64, review: &AchievementReview) -> StoreResult<bool>;

    fn list_leaves(&self) -> StoreResult<Vec<LeaveApplication>>;
    fn insert_leave(&mut self, leave: NewLeave) -> StoreResult<LeaveApplication>;
    fn set_leave_status(&mut self, id: i64, status: ReviewStatus) -> StoreResult<bool>;

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.list_users()?.is_empty() && self.list_students()?.is_empty())
    }
}

pub fn find_student(store: &dyn Store, id: i64) -> StoreResult<Student> {
    store
        .list_students()?
        .into_iter()
        .find(|s| s.id == id)
        .ok_or(StoreError::NotFound {
            entity: "student",
            id,
        })
}

pub fn find_subject(store: &dyn Store, id: i64) -> StoreResult<Subject> {
    store
        .list_subjects()?
        .into_iter()
        .find(|s| s.id == id)
        .ok_or(StoreError::NotFound {
            entity: "subject",
            id,
        })
}

/// Opens the requested backend. SQLite opens (and migrates) the file at `db_path`.
pub fn open_store(backend: Backend, db_path: &Path, seed: bool) -> anyhow::Result<Box<dyn Store>> {
    let mut store: Box<dyn Store> = match backend {
        Backend::Memory => Box::new(MemoryStore::new()),
        Backend::Sqlite => Box::new(SqliteStore::open(db_path)?),
    };
    if seed && store.is_empty()? {
        crate::seed::seed_demo_data(store.as_mut())?;
        tracing::info!(backend = backend.as_str(), "seeded demo data");
    }
    Ok(store)
}
