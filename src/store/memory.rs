use super::{Backend, Store, StoreError, StoreResult};
use crate::model::{
    Achievement, AchievementCategory, AchievementReview, AchievementStatus, Certificate,
    LeaveApplication, MarkRecord, NewAchievement, NewCertificate, NewLeave, NewStudent,
    NewSubject, NewUser, ReviewStatus, Student, StudentPatch, Subject, User,
};
use crate::seed;

/// Process-local tables. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    next_id: i64,
    users: Vec<User>,
    students: Vec<Student>,
    subjects: Vec<Subject>,
    marks: Vec<MarkRecord>,
    certificates: Vec<Certificate>,
    achievements: Vec<Achievement>,
    leaves: Vec<LeaveApplication>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Ids are unique across tables, which keeps them stable for one process run.
    fn alloc_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl Store for MemoryStore {
    fn backend(&self) -> Backend {
        Backend::Memory
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.users.clone())
    }

    fn create_user(&mut self, user: NewUser) -> StoreResult<User> {
        let created = User {
            id: self.alloc_id(),
            name: user.name,
            email: user.email,
            role: user.role,
            year: user.year,
            subject: user.subject,
        };
        self.users.push(created.clone());
        Ok(created)
    }

    fn delete_user(&mut self, id: i64) -> StoreResult<bool> {
        let before = self.users.len();
        self.users.retain(|u| u.id != id);
        Ok(self.users.len() < before)
    }

    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users.iter().find(|u| u.email == email).cloned())
    }

    fn list_students(&self) -> StoreResult<Vec<Student>> {
        Ok(self.students.clone())
    }

    fn insert_student(&mut self, student: NewStudent) -> StoreResult<Student> {
        let created = Student {
            id: self.alloc_id(),
            name: student.name,
            email: student.email,
            roll_no: student.roll_no,
            year: student.year,
            internal1: student.internal1,
            internal2: student.internal2,
            attendance: student.attendance,
            cgpa: student.cgpa,
        };
        self.students.push(created.clone());
        Ok(created)
    }

    fn update_student(&mut self, id: i64, patch: &StudentPatch) -> StoreResult<bool> {
        let Some(s) = self.students.iter_mut().find(|s| s.id == id) else {
            return Ok(false);
        };
        patch.apply(s);
        Ok(true)
    }

    fn list_subjects(&self) -> StoreResult<Vec<Subject>> {
        Ok(self.subjects.clone())
    }

    fn create_subject(&mut self, subject: NewSubject) -> StoreResult<Subject> {
        let created = Subject {
            id: self.alloc_id(),
            name: subject.name,
            code: subject.code,
            year: subject.year,
            staff_id: subject.staff_id,
            staff_name: subject.staff_name,
            total_students: subject.total_students,
            last_updated: subject.last_updated,
        };
        self.subjects.push(created.clone());
        Ok(created)
    }

    fn delete_subject(&mut self, id: i64) -> StoreResult<bool> {
        let before = self.subjects.len();
        self.subjects.retain(|s| s.id != id);
        self.marks.retain(|m| m.subject_id != id);
        Ok(self.subjects.len() < before)
    }

    fn touch_subject(&mut self, id: i64, date: &str) -> StoreResult<bool> {
        let Some(s) = self.subjects.iter_mut().find(|s| s.id == id) else {
            return Ok(false);
        };
        s.last_updated = date.to_string();
        Ok(true)
    }

    fn list_marks(&self) -> StoreResult<Vec<MarkRecord>> {
        Ok(self.marks.clone())
    }

    fn upsert_marks(&mut self, marks: &[MarkRecord]) -> StoreResult<usize> {
        for mark in marks {
            match self
                .marks
                .iter_mut()
                .find(|m| m.student_id == mark.student_id && m.subject_id == mark.subject_id)
            {
                Some(existing) => *existing = *mark,
                None => self.marks.push(*mark),
            }
        }
        Ok(marks.len())
    }

    fn list_certificates(&self) -> StoreResult<Vec<Certificate>> {
        let mut out = self.certificates.clone();
        out.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(out)
    }

    fn insert_certificate(&mut self, certificate: NewCertificate) -> StoreResult<Certificate> {
        let created = Certificate {
            id: self.alloc_id(),
            student_name: certificate.student_name,
            kind: certificate.kind,
            company: certificate.company,
            status: certificate.status,
            upload_date: certificate.upload_date,
        };
        self.certificates.push(created.clone());
        Ok(created)
    }

    fn set_certificate_status(&mut self, id: i64, status: ReviewStatus) -> StoreResult<bool> {
        let Some(c) = self.certificates.iter_mut().find(|c| c.id == id) else {
            return Ok(false);
        };
        c.status = status;
        Ok(true)
    }

    fn achievement_categories(&self) -> StoreResult<Vec<AchievementCategory>> {
        Ok(seed::achievement_categories())
    }

    fn list_achievements(&self) -> StoreResult<Vec<Achievement>> {
        let mut out = self.achievements.clone();
        out.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(out)
    }

    fn insert_achievement(&mut self, achievement: NewAchievement) -> StoreResult<Achievement> {
        if !seed::achievement_categories()
            .iter()
            .any(|c| c.id == achievement.category_id)
        {
            return Err(StoreError::NotFound {
                entity: "achievement category",
                id: achievement.category_id,
            });
        }
        let created = Achievement {
            id: self.alloc_id(),
            student_id: achievement.student_id,
            category_id: achievement.category_id,
            title: achievement.title,
            description: achievement.description,
            proof_file: achievement.proof_file,
            achievement_date: achievement.achievement_date,
            points_awarded: 0,
            status: AchievementStatus::Pending,
            rejection_reason: None,
            uploaded_at: achievement.uploaded_at,
        };
        self.achievements.push(created.clone());
        Ok(created)
    }

    fn review_achievement(&mut self, id: i64, review: &AchievementReview) -> StoreResult<bool> {
        let Some(a) = self.achievements.iter_mut().find(|a| a.id == id) else {
            return Ok(false);
        };
        a.status = review.status;
        a.points_awarded = review.points_awarded;
        a.rejection_reason = review.rejection_reason.clone();
        Ok(true)
    }

    fn list_leaves(&self) -> StoreResult<Vec<LeaveApplication>> {
        Ok(self.leaves.clone())
    }

    fn insert_leave(&mut self, leave: NewLeave) -> StoreResult<LeaveApplication> {
        let created = LeaveApplication {
            id: self.alloc_id(),
            student_id: leave.student_id,
            student_name: leave.student_name,
            roll_no: leave.roll_no,
            leave_date: leave.leave_date,
            reason: leave.reason,
            status: ReviewStatus::Pending,
            applied_on: leave.applied_on,
        };
        self.leaves.push(created.clone());
        Ok(created)
    }

    fn set_leave_status(&mut self, id: i64, status: ReviewStatus) -> StoreResult<bool> {
        let Some(l) = self.leaves.iter_mut().find(|l| l.id == id) else {
            return Ok(false);
        };
        l.status = status;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    fn new_student(name: &str, roll: &str, year: &str) -> NewStudent {
        NewStudent {
            name: name.to_string(),
            email: None,
            roll_no: roll.to_string(),
            year: Some(year.to_string()),
            internal1: 0.0,
            internal2: 0.0,
            attendance: 0.0,
            cgpa: None,
        }
    }

    #[test]
    fn deleting_a_subject_drops_its_marks() {
        let mut store = MemoryStore::new();
        let s = store.insert_student(new_student("A", "R1", "1")).expect("student");
        let keep = store
            .create_subject(NewSubject {
                name: "Keep".into(),
                code: "K1".into(),
                year: "1".into(),
                staff_id: 0,
                staff_name: String::new(),
                total_students: 0,
                last_updated: "2025-01-01".into(),
            })
            .expect("subject");
        let drop = store
            .create_subject(NewSubject {
                name: "Drop".into(),
                code: "D1".into(),
                year: "1".into(),
                staff_id: 0,
                staff_name: String::new(),
                total_students: 0,
                last_updated: "2025-01-01".into(),
            })
            .expect("subject");
        store
            .upsert_marks(&[MarkRecord::blank(s.id, keep.id), MarkRecord::blank(s.id, drop.id)])
            .expect("marks");

        assert!(store.delete_subject(drop.id).expect("delete"));
        assert!(!store.delete_subject(drop.id).expect("delete again"));
        let marks = store.list_marks().expect("marks");
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].subject_id, keep.id);
    }

    #[test]
    fn upsert_replaces_existing_pair() {
        let mut store = MemoryStore::new();
        let mut m = MarkRecord::blank(1, 2);
        store.upsert_marks(&[m]).expect("insert");
        m.test1 = 40.0;
        store.upsert_marks(&[m]).expect("replace");
        let marks = store.list_marks().expect("marks");
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].test1, 40.0);
    }

    #[test]
    fn update_missing_student_is_a_no_op() {
        let mut store = MemoryStore::new();
        let patch = StudentPatch {
            attendance: Some(50.0),
            ..Default::default()
        };
        assert!(!store.update_student(99, &patch).expect("update"));
    }

    #[test]
    fn users_lookup_by_exact_email() {
        let mut store = MemoryStore::new();
        store
            .create_user(NewUser {
                name: "Head".into(),
                email: "hod@college.edu".into(),
                role: Role::Hod,
                year: String::new(),
                subject: "-".into(),
            })
            .expect("user");
        assert!(store
            .find_user_by_email("hod@college.edu")
            .expect("lookup")
            .is_some());
        assert!(store
            .find_user_by_email("HOD@college.edu")
            .expect("lookup")
            .is_none());
    }
}
