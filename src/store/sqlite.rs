use super::{Backend, Store, StoreError, StoreResult};
use crate::model::{
    Achievement, AchievementCategory, AchievementReview, AchievementStatus, Certificate,
    LeaveApplication, MarkRecord, NewAchievement, NewCertificate, NewLeave, NewStudent,
    NewSubject, NewUser, ReviewStatus, Role, Student, StudentPatch, Subject, User,
};
use crate::seed;
use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory {}", parent.to_string_lossy())
            })?;
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("failed to open database {}", db_path.to_string_lossy()))?;
        migrate(&conn)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrate(&conn)?;
        Ok(Self { conn })
    }
}

fn migrate(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            role TEXT NOT NULL,
            year TEXT NOT NULL DEFAULT '',
            subject TEXT NOT NULL DEFAULT ''
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT,
            roll_no TEXT NOT NULL,
            year TEXT,
            internal1 REAL NOT NULL DEFAULT 0,
            internal2 REAL NOT NULL DEFAULT 0,
            attendance REAL NOT NULL DEFAULT 0,
            cgpa REAL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_year ON students(year)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            code TEXT NOT NULL,
            year TEXT NOT NULL,
            staff_id INTEGER NOT NULL,
            staff_name TEXT NOT NULL,
            total_students INTEGER NOT NULL DEFAULT 0,
            last_updated TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subject_marks(
            student_id INTEGER NOT NULL,
            subject_id INTEGER NOT NULL,
            test1 REAL NOT NULL DEFAULT 0,
            test2 REAL NOT NULL DEFAULT 0,
            assignment REAL NOT NULL DEFAULT 0,
            PRIMARY KEY(student_id, subject_id),
            FOREIGN KEY(subject_id) REFERENCES subjects(id) ON DELETE CASCADE
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subject_marks_subject ON subject_marks(subject_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS certificates(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_name TEXT NOT NULL,
            type TEXT NOT NULL,
            company TEXT NOT NULL,
            status TEXT NOT NULL,
            upload_date TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS achievement_categories(
            id INTEGER PRIMARY KEY,
            category_name TEXT NOT NULL,
            points INTEGER NOT NULL,
            description TEXT NOT NULL
        )",
        [],
    )?;
    for c in seed::achievement_categories() {
        conn.execute(
            "INSERT OR IGNORE INTO achievement_categories(id, category_name, points, description)
             VALUES(?, ?, ?, ?)",
            params![c.id, c.category_name, c.points, c.description],
        )?;
    }

    conn.execute(
        "CREATE TABLE IF NOT EXISTS achievements(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            proof_file TEXT NOT NULL,
            achievement_date TEXT NOT NULL,
            points_awarded INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL,
            uploaded_at TEXT NOT NULL,
            FOREIGN KEY(category_id) REFERENCES achievement_categories(id)
        )",
        [],
    )?;
    // Databases created before rejection reasons were recorded lack the column.
    ensure_achievements_rejection_reason(conn)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS leave_applications(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL,
            student_name TEXT NOT NULL,
            roll_no TEXT NOT NULL,
            leave_date TEXT NOT NULL,
            reason TEXT NOT NULL,
            status TEXT NOT NULL,
            applied_on TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

fn ensure_achievements_rejection_reason(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "achievements", "rejection_reason")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE achievements ADD COLUMN rejection_reason TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn text_err(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        msg.into(),
    )
}

fn user_from_row(r: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = r.get(3)?;
    Ok(User {
        id: r.get(0)?,
        name: r.get(1)?,
        email: r.get(2)?,
        role: role.parse::<Role>().map_err(|e| text_err(3, e))?,
        year: r.get(4)?,
        subject: r.get(5)?,
    })
}

fn student_from_row(r: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: r.get(0)?,
        name: r.get(1)?,
        email: r.get(2)?,
        roll_no: r.get(3)?,
        year: r.get(4)?,
        internal1: r.get(5)?,
        internal2: r.get(6)?,
        attendance: r.get(7)?,
        cgpa: r.get(8)?,
    })
}

fn subject_from_row(r: &Row<'_>) -> rusqlite::Result<Subject> {
    Ok(Subject {
        id: r.get(0)?,
        name: r.get(1)?,
        code: r.get(2)?,
        year: r.get(3)?,
        staff_id: r.get(4)?,
        staff_name: r.get(5)?,
        total_students: r.get(6)?,
        last_updated: r.get(7)?,
    })
}

fn review_status_at(r: &Row<'_>, idx: usize) -> rusqlite::Result<ReviewStatus> {
    let raw: String = r.get(idx)?;
    raw.parse::<ReviewStatus>().map_err(|e| text_err(idx, e))
}

fn certificate_from_row(r: &Row<'_>) -> rusqlite::Result<Certificate> {
    Ok(Certificate {
        id: r.get(0)?,
        student_name: r.get(1)?,
        kind: r.get(2)?,
        company: r.get(3)?,
        status: review_status_at(r, 4)?,
        upload_date: r.get(5)?,
    })
}

fn achievement_from_row(r: &Row<'_>) -> rusqlite::Result<Achievement> {
    let status: String = r.get(8)?;
    Ok(Achievement {
        id: r.get(0)?,
        student_id: r.get(1)?,
        category_id: r.get(2)?,
        title: r.get(3)?,
        description: r.get(4)?,
        proof_file: r.get(5)?,
        achievement_date: r.get(6)?,
        points_awarded: r.get(7)?,
        status: status
            .parse::<AchievementStatus>()
            .map_err(|e| text_err(8, e))?,
        uploaded_at: r.get(9)?,
        rejection_reason: r.get(10)?,
    })
}

fn leave_from_row(r: &Row<'_>) -> rusqlite::Result<LeaveApplication> {
    Ok(LeaveApplication {
        id: r.get(0)?,
        student_id: r.get(1)?,
        student_name: r.get(2)?,
        roll_no: r.get(3)?,
        leave_date: r.get(4)?,
        reason: r.get(5)?,
        status: review_status_at(r, 6)?,
        applied_on: r.get(7)?,
    })
}

const USER_COLS: &str = "id, name, email, role, year, subject";
const STUDENT_COLS: &str =
    "id, name, email, roll_no, year, internal1, internal2, attendance, cgpa";
const SUBJECT_COLS: &str =
    "id, name, code, year, staff_id, staff_name, total_students, last_updated";
const CERTIFICATE_COLS: &str = "id, student_name, type, company, status, upload_date";
const ACHIEVEMENT_COLS: &str = "id, student_id, category_id, title, description, proof_file,
     achievement_date, points_awarded, status, uploaded_at, rejection_reason";
const LEAVE_COLS: &str =
    "id, student_id, student_name, roll_no, leave_date, reason, status, applied_on";

impl SqliteStore {
    fn query_all<T>(
        &self,
        sql: &str,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> StoreResult<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map([], map)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn query_by_id<T>(
        &self,
        sql: &str,
        id: i64,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> StoreResult<T> {
        Ok(self.conn.query_row(sql, [id], map)?)
    }
}

impl Store for SqliteStore {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        self.query_all(
            &format!("SELECT {} FROM users ORDER BY id", USER_COLS),
            user_from_row,
        )
    }

    fn create_user(&mut self, user: NewUser) -> StoreResult<User> {
        self.conn.execute(
            "INSERT INTO users(name, email, role, year, subject) VALUES(?, ?, ?, ?, ?)",
            params![user.name, user.email, user.role.as_str(), user.year, user.subject],
        )?;
        let id = self.conn.last_insert_rowid();
        self.query_by_id(
            &format!("SELECT {} FROM users WHERE id = ?", USER_COLS),
            id,
            user_from_row,
        )
    }

    fn delete_user(&mut self, id: i64) -> StoreResult<bool> {
        let n = self.conn.execute("DELETE FROM users WHERE id = ?", [id])?;
        Ok(n > 0)
    }

    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM users WHERE email = ? ORDER BY id LIMIT 1",
                    USER_COLS
                ),
                [email],
                user_from_row,
            )
            .optional()?)
    }

    fn list_students(&self) -> StoreResult<Vec<Student>> {
        self.query_all(
            &format!("SELECT {} FROM students ORDER BY id", STUDENT_COLS),
            student_from_row,
        )
    }

    fn insert_student(&mut self, student: NewStudent) -> StoreResult<Student> {
        self.conn.execute(
            "INSERT INTO students(name, email, roll_no, year, internal1, internal2, attendance, cgpa)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                student.name,
                student.email,
                student.roll_no,
                student.year,
                student.internal1,
                student.internal2,
                student.attendance,
                student.cgpa
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.query_by_id(
            &format!("SELECT {} FROM students WHERE id = ?", STUDENT_COLS),
            id,
            student_from_row,
        )
    }

    fn update_student(&mut self, id: i64, patch: &StudentPatch) -> StoreResult<bool> {
        let current = self
            .conn
            .query_row(
                &format!("SELECT {} FROM students WHERE id = ?", STUDENT_COLS),
                [id],
                student_from_row,
            )
            .optional()?;
        let Some(mut s) = current else {
            return Ok(false);
        };
        patch.apply(&mut s);
        self.conn.execute(
            "UPDATE students
             SET name = ?, email = ?, roll_no = ?, year = ?,
                 internal1 = ?, internal2 = ?, attendance = ?, cgpa = ?
             WHERE id = ?",
            params![
                s.name,
                s.email,
                s.roll_no,
                s.year,
                s.internal1,
                s.internal2,
                s.attendance,
                s.cgpa,
                id
            ],
        )?;
        Ok(true)
    }

    fn list_subjects(&self) -> StoreResult<Vec<Subject>> {
        self.query_all(
            &format!("SELECT {} FROM subjects ORDER BY id", SUBJECT_COLS),
            subject_from_row,
        )
    }

    fn create_subject(&mut self, subject: NewSubject) -> StoreResult<Subject> {
        self.conn.execute(
            "INSERT INTO subjects(name, code, year, staff_id, staff_name, total_students, last_updated)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            params![
                subject.name,
                subject.code,
                subject.year,
                subject.staff_id,
                subject.staff_name,
                subject.total_students,
                subject.last_updated
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.query_by_id(
            &format!("SELECT {} FROM subjects WHERE id = ?", SUBJECT_COLS),
            id,
            subject_from_row,
        )
    }

    fn delete_subject(&mut self, id: i64) -> StoreResult<bool> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM subject_marks WHERE subject_id = ?", [id])?;
        let n = tx.execute("DELETE FROM subjects WHERE id = ?", [id])?;
        tx.commit()?;
        Ok(n > 0)
    }

    fn touch_subject(&mut self, id: i64, date: &str) -> StoreResult<bool> {
        let n = self.conn.execute(
            "UPDATE subjects SET last_updated = ? WHERE id = ?",
            params![date, id],
        )?;
        Ok(n > 0)
    }

    fn list_marks(&self) -> StoreResult<Vec<MarkRecord>> {
        self.query_all(
            "SELECT student_id, subject_id, test1, test2, assignment
             FROM subject_marks
             ORDER BY rowid",
            |r| {
                Ok(MarkRecord {
                    student_id: r.get(0)?,
                    subject_id: r.get(1)?,
                    test1: r.get(2)?,
                    test2: r.get(3)?,
                    assignment: r.get(4)?,
                })
            },
        )
    }

    fn upsert_marks(&mut self, marks: &[MarkRecord]) -> StoreResult<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO subject_marks(student_id, subject_id, test1, test2, assignment)
                 VALUES(?, ?, ?, ?, ?)
                 ON CONFLICT(student_id, subject_id) DO UPDATE SET
                   test1 = excluded.test1,
                   test2 = excluded.test2,
                   assignment = excluded.assignment",
            )?;
            for m in marks {
                stmt.execute(params![
                    m.student_id,
                    m.subject_id,
                    m.test1,
                    m.test2,
                    m.assignment
                ])?;
            }
        }
        tx.commit()?;
        Ok(marks.len())
    }

    fn list_certificates(&self) -> StoreResult<Vec<Certificate>> {
        self.query_all(
            &format!("SELECT {} FROM certificates ORDER BY id DESC", CERTIFICATE_COLS),
            certificate_from_row,
        )
    }

    fn insert_certificate(&mut self, certificate: NewCertificate) -> StoreResult<Certificate> {
        self.conn.execute(
            "INSERT INTO certificates(student_name, type, company, status, upload_date)
             VALUES(?, ?, ?, ?, ?)",
            params![
                certificate.student_name,
                certificate.kind,
                certificate.company,
                certificate.status.as_str(),
                certificate.upload_date
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.query_by_id(
            &format!("SELECT {} FROM certificates WHERE id = ?", CERTIFICATE_COLS),
            id,
            certificate_from_row,
        )
    }

    fn set_certificate_status(&mut self, id: i64, status: ReviewStatus) -> StoreResult<bool> {
        let n = self.conn.execute(
            "UPDATE certificates SET status = ? WHERE id = ?",
            params![status.as_str(), id],
        )?;
        Ok(n > 0)
    }

    fn achievement_categories(&self) -> StoreResult<Vec<AchievementCategory>> {
        self.query_all(
            "SELECT id, category_name, points, description
             FROM achievement_categories
             ORDER BY id",
            |r| {
                Ok(AchievementCategory {
                    id: r.get(0)?,
                    category_name: r.get(1)?,
                    points: r.get(2)?,
                    description: r.get(3)?,
                })
            },
        )
    }

    fn list_achievements(&self) -> StoreResult<Vec<Achievement>> {
        self.query_all(
            &format!("SELECT {} FROM achievements ORDER BY id DESC", ACHIEVEMENT_COLS),
            achievement_from_row,
        )
    }

    fn insert_achievement(&mut self, achievement: NewAchievement) -> StoreResult<Achievement> {
        let category_known = self
            .conn
            .query_row(
                "SELECT 1 FROM achievement_categories WHERE id = ?",
                [achievement.category_id],
                |r| r.get::<_, i64>(0),
            )
            .optional()?
            .is_some();
        if !category_known {
            return Err(StoreError::NotFound {
                entity: "achievement category",
                id: achievement.category_id,
            });
        }
        self.conn.execute(
            "INSERT INTO achievements(student_id, category_id, title, description, proof_file,
                                      achievement_date, points_awarded, status, uploaded_at)
             VALUES(?, ?, ?, ?, ?, ?, 0, ?, ?)",
            params![
                achievement.student_id,
                achievement.category_id,
                achievement.title,
                achievement.description,
                achievement.proof_file,
                achievement.achievement_date,
                AchievementStatus::Pending.as_str(),
                achievement.uploaded_at
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.query_by_id(
            &format!("SELECT {} FROM achievements WHERE id = ?", ACHIEVEMENT_COLS),
            id,
            achievement_from_row,
        )
    }

    fn review_achievement(&mut self, id: i64, review: &AchievementReview) -> StoreResult<bool> {
        let n = self.conn.execute(
            "UPDATE achievements
             SET status = ?, points_awarded = ?, rejection_reason = ?
             WHERE id = ?",
            params![
                review.status.as_str(),
                review.points_awarded,
                review.rejection_reason,
                id
            ],
        )?;
        Ok(n > 0)
    }

    fn list_leaves(&self) -> StoreResult<Vec<LeaveApplication>> {
        self.query_all(
            &format!("SELECT {} FROM leave_applications ORDER BY id", LEAVE_COLS),
            leave_from_row,
        )
    }

    fn insert_leave(&mut self, leave: NewLeave) -> StoreResult<LeaveApplication> {
        self.conn.execute(
            "INSERT INTO leave_applications(student_id, student_name, roll_no, leave_date,
                                            reason, status, applied_on)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            params![
                leave.student_id,
                leave.student_name,
                leave.roll_no,
                leave.leave_date,
                leave.reason,
                ReviewStatus::Pending.as_str(),
                leave.applied_on
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.query_by_id(
            &format!("SELECT {} FROM leave_applications WHERE id = ?", LEAVE_COLS),
            id,
            leave_from_row,
        )
    }

    fn set_leave_status(&mut self, id: i64, status: ReviewStatus) -> StoreResult<bool> {
        let n = self.conn.execute(
            "UPDATE leave_applications SET status = ? WHERE id = ?",
            params![status.as_str(), id],
        )?;
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_is_idempotent_and_seeds_categories() {
        let store = SqliteStore::open_in_memory().expect("open");
        migrate(&store.conn).expect("second migrate");
        let cats = store.achievement_categories().expect("categories");
        assert_eq!(cats.len(), seed::achievement_categories().len());
        assert!(table_has_column(&store.conn, "achievements", "rejection_reason").expect("pragma"));
    }

    #[test]
    fn marks_upsert_on_conflict_replaces() {
        let mut store = SqliteStore::open_in_memory().expect("open");
        let subject = store
            .create_subject(NewSubject {
                name: "Physics".into(),
                code: "PHY101".into(),
                year: "1".into(),
                staff_id: 2,
                staff_name: "Prof".into(),
                total_students: 60,
                last_updated: "2025-05-14".into(),
            })
            .expect("subject");
        let mut m = MarkRecord::blank(7, subject.id);
        store.upsert_marks(&[m]).expect("insert");
        m.test2 = 33.0;
        store.upsert_marks(&[m]).expect("update");
        let marks = store.list_marks().expect("marks");
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].test2, 33.0);

        assert!(store.delete_subject(subject.id).expect("delete"));
        assert!(store.list_marks().expect("marks").is_empty());
    }

    #[test]
    fn review_round_trips_status_and_reason() {
        let mut store = SqliteStore::open_in_memory().expect("open");
        let a = store
            .insert_achievement(NewAchievement {
                student_id: 1,
                category_id: 3,
                title: "Hack".into(),
                description: String::new(),
                proof_file: "p.pdf".into(),
                achievement_date: "2024-11-20".into(),
                uploaded_at: "2024-11-21".into(),
            })
            .expect("insert");
        assert_eq!(a.status, AchievementStatus::Pending);
        store
            .review_achievement(
                a.id,
                &AchievementReview {
                    status: AchievementStatus::Rejected,
                    points_awarded: 0,
                    rejection_reason: Some("blurry proof".into()),
                },
            )
            .expect("review");
        let all = store.list_achievements().expect("list");
        assert_eq!(all[0].status, AchievementStatus::Rejected);
        assert_eq!(all[0].rejection_reason.as_deref(), Some("blurry proof"));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let mut store = SqliteStore::open_in_memory().expect("open");
        let err = store
            .insert_achievement(NewAchievement {
                student_id: 1,
                category_id: 999,
                title: "x".into(),
                description: String::new(),
                proof_file: String::new(),
                achievement_date: String::new(),
                uploaded_at: String::new(),
            })
            .expect_err("unknown category");
        assert_eq!(err.code(), "not_found");
    }
}
