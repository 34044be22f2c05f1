use crate::model::{
    Achievement, AchievementCategory, MarkRecord, Student, StudentSubjectMark, Subject,
    MARK_MAX_TOTAL,
};
use crate::store::{Store, StoreResult};
use serde::Serialize;
use std::collections::HashMap;

/// `None`, `""`, `"All"` and `"All Years"` all mean every year.
pub fn year_scope(year: Option<&str>) -> Option<&str> {
    match year.map(str::trim) {
        None | Some("") => None,
        Some(y) if y.eq_ignore_ascii_case("all") || y.eq_ignore_ascii_case("all years") => None,
        Some(y) => Some(y),
    }
}

pub fn students_in_scope(students: Vec<Student>, year: Option<&str>) -> Vec<Student> {
    match year_scope(year) {
        None => students,
        Some(y) => students.into_iter().filter(|s| s.in_year(y)).collect(),
    }
}

pub fn mark_view(student: &Student, subject: &Subject, record: &MarkRecord) -> StudentSubjectMark {
    StudentSubjectMark {
        student_id: student.id,
        student_name: student.name.clone(),
        roll_no: student.roll_no.clone(),
        subject_id: subject.id,
        subject_name: subject.name.clone(),
        test1: record.test1,
        test2: record.test2,
        assignment: record.assignment,
        total: record.total(),
        max_total: MARK_MAX_TOTAL,
    }
}

/// One row per student of the subject's year. Students without stored marks
/// get a zeroed placeholder row.
pub fn subject_sheet(store: &dyn Store, subject: &Subject) -> StoreResult<Vec<StudentSubjectMark>> {
    let marks: HashMap<i64, MarkRecord> = store
        .list_marks()?
        .into_iter()
        .filter(|m| m.subject_id == subject.id)
        .map(|m| (m.student_id, m))
        .collect();
    Ok(store
        .list_students()?
        .iter()
        .filter(|s| s.in_year(&subject.year))
        .map(|s| {
            let record = marks
                .get(&s.id)
                .copied()
                .unwrap_or_else(|| MarkRecord::blank(s.id, subject.id));
            mark_view(s, subject, &record)
        })
        .collect())
}

/// Stored marks only, in store order.
pub fn recorded_subject_marks(
    store: &dyn Store,
    subject: &Subject,
) -> StoreResult<Vec<StudentSubjectMark>> {
    let students: HashMap<i64, Student> = store
        .list_students()?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();
    Ok(store
        .list_marks()?
        .iter()
        .filter(|m| m.subject_id == subject.id)
        .filter_map(|m| students.get(&m.student_id).map(|s| mark_view(s, subject, m)))
        .collect())
}

pub fn student_marks(store: &dyn Store, student: &Student) -> StoreResult<Vec<StudentSubjectMark>> {
    let subjects: HashMap<i64, Subject> = store
        .list_subjects()?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();
    Ok(store
        .list_marks()?
        .iter()
        .filter(|m| m.student_id == student.id)
        .filter_map(|m| subjects.get(&m.subject_id).map(|subj| mark_view(student, subj, m)))
        .collect())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    #[serde(flatten)]
    pub student: Student,
    /// False when the profile was synthesised from a directory account that
    /// has no roster entry.
    pub enrolled: bool,
}

pub fn student_by_email(store: &dyn Store, email: &str) -> StoreResult<Option<Student>> {
    let email = email.trim();
    Ok(store
        .list_students()?
        .into_iter()
        .find(|s| s.email.as_deref().map(str::trim) == Some(email)))
}

pub fn profile_by_email(store: &dyn Store, email: &str) -> StoreResult<Option<StudentProfile>> {
    if let Some(student) = student_by_email(store, email)? {
        return Ok(Some(StudentProfile {
            student,
            enrolled: true,
        }));
    }
    let Some(user) = store.find_user_by_email(email.trim())? else {
        return Ok(None);
    };
    let year = if user.year.trim().is_empty() {
        "1".to_string()
    } else {
        user.year.clone()
    };
    Ok(Some(StudentProfile {
        student: Student {
            id: 0,
            name: user.name,
            email: Some(user.email),
            roll_no: "N/A".to_string(),
            year: Some(year),
            internal1: 0.0,
            internal2: 0.0,
            attendance: 0.0,
            cgpa: Some(0.0),
        },
        enrolled: false,
    }))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementView {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub student_name: String,
    pub roll_no: String,
    pub student_year: String,
    pub category_name: String,
}

pub fn achievement_views(
    achievements: Vec<Achievement>,
    students: &[Student],
    categories: &[AchievementCategory],
) -> Vec<AchievementView> {
    achievements
        .into_iter()
        .map(|a| {
            let student = students.iter().find(|s| s.id == a.student_id);
            let category_name = categories
                .iter()
                .find(|c| c.id == a.category_id)
                .map(|c| c.category_name.clone())
                .unwrap_or_else(|| "General".to_string());
            AchievementView {
                student_name: student
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                roll_no: student
                    .map(|s| s.roll_no.clone())
                    .unwrap_or_else(|| "N/A".to_string()),
                student_year: student
                    .and_then(|s| s.year.clone())
                    .unwrap_or_else(|| "N/A".to_string()),
                category_name,
                achievement: a,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;
    use crate::store::MemoryStore;

    fn seeded() -> MemoryStore {
        let mut store = MemoryStore::new();
        seed::seed_demo_data(&mut store).expect("seed");
        store
    }

    #[test]
    fn year_scope_treats_all_variants_as_unfiltered() {
        assert_eq!(year_scope(None), None);
        assert_eq!(year_scope(Some("All")), None);
        assert_eq!(year_scope(Some("All Years")), None);
        assert_eq!(year_scope(Some(" 2 ")), Some("2"));
    }

    #[test]
    fn subject_sheet_fills_placeholders_for_the_year() {
        let store = seeded();
        let maths = store
            .list_subjects()
            .expect("subjects")
            .into_iter()
            .find(|s| s.code == "MAT101")
            .expect("maths");
        let sheet = subject_sheet(&store, &maths).expect("sheet");
        assert_eq!(sheet.len(), 5);
        let arun = sheet.iter().find(|m| m.roll_no == "CS101").expect("arun");
        assert_eq!(arun.total, 93.0);
        let rahul = sheet.iter().find(|m| m.roll_no == "CS103").expect("rahul");
        assert_eq!(rahul.total, 0.0);
        assert_eq!(rahul.max_total, 100.0);

        let recorded = recorded_subject_marks(&store, &maths).expect("recorded");
        assert_eq!(recorded.len(), 2);
    }

    #[test]
    fn profile_falls_back_to_directory_account() {
        let mut store = seeded();
        store
            .create_user(crate::model::NewUser {
                name: "New Student".into(),
                email: "new@student.edu".into(),
                role: crate::model::Role::Student,
                year: String::new(),
                subject: "-".into(),
            })
            .expect("user");
        let p = profile_by_email(&store, "new@student.edu")
            .expect("lookup")
            .expect("profile");
        assert!(!p.enrolled);
        assert_eq!(p.student.roll_no, "N/A");
        assert_eq!(p.student.year.as_deref(), Some("1"));

        let enrolled = profile_by_email(&store, "arun@student.edu")
            .expect("lookup")
            .expect("profile");
        assert!(enrolled.enrolled);
        assert_eq!(enrolled.student.roll_no, "CS101");

        assert!(profile_by_email(&store, "nobody@x.edu").expect("lookup").is_none());
    }
}
