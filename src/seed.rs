use crate::model::{
    AchievementCategory, AchievementReview, AchievementStatus, MarkRecord, NewAchievement,
    NewCertificate, NewStudent, NewSubject, NewUser, ReviewStatus, Role,
};
use crate::store::Store;
use std::collections::HashMap;

pub fn achievement_categories() -> Vec<AchievementCategory> {
    [
        (1, "Paper Presentation", 20, "Presented research paper at conference"),
        (2, "Hackathon Winner", 25, "Won a hackathon competition"),
        (3, "Hackathon Participation", 10, "Participated in hackathon"),
        (4, "Certification", 15, "Completed NPTEL/Coursera certification"),
        (5, "Workshop/Seminar", 5, "Attended workshop or seminar"),
        (6, "Internship", 20, "Completed internship program"),
        (7, "Competition Winner", 25, "Won competitive event"),
        (8, "Competition Participation", 10, "Participated in competition"),
    ]
    .into_iter()
    .map(|(id, name, points, description)| AchievementCategory {
        id,
        category_name: name.to_string(),
        points,
        description: description.to_string(),
    })
    .collect()
}

pub const INTERNSHIP_CATEGORY_ID: i64 = 6;

#[allow(clippy::too_many_arguments)]
fn student(
    name: &str,
    email: Option<&str>,
    roll: &str,
    year: &str,
    i1: f64,
    i2: f64,
    attendance: f64,
    cgpa: f64,
) -> NewStudent {
    NewStudent {
        name: name.to_string(),
        email: email.map(str::to_string),
        roll_no: roll.to_string(),
        year: Some(year.to_string()),
        internal1: i1,
        internal2: i2,
        attendance,
        cgpa: Some(cgpa),
    }
}

/// Loads the demo department: staff and student accounts, a four-year roster,
/// subjects per year, a handful of marks, certificates and achievements.
pub fn seed_demo_data(store: &mut dyn Store) -> anyhow::Result<()> {
    let users = [
        ("Dr. Rajesh Kumar", "rajesh@college.edu", Role::Staff, "1", "Mathematics"),
        ("Prof. Priya Sharma", "priya@college.edu", Role::Staff, "2", "Physics"),
        ("Dr. Amit Patel", "amit@college.edu", Role::Staff, "3", "Data Structures"),
        ("Arun Kumar", "arun@student.edu", Role::Student, "1", "-"),
        ("Sneha Reddy", "sneha@student.edu", Role::Student, "2", "-"),
    ];
    let mut staff_ids: HashMap<&str, i64> = HashMap::new();
    for (name, email, role, year, subject) in users {
        let u = store.create_user(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            role,
            year: year.to_string(),
            subject: subject.to_string(),
        })?;
        staff_ids.insert(name, u.id);
    }

    let roster = [
        student("Arun Kumar", Some("arun@student.edu"), "CS101", "1", 85.0, 90.0, 92.0, 8.5),
        student("Sneha Reddy", Some("sneha@student.edu"), "CS102", "1", 78.0, 82.0, 88.0, 8.2),
        student("Rahul Verma", None, "CS103", "1", 92.0, 95.0, 95.0, 9.0),
        student("Priya Singh", None, "CS104", "1", 70.0, 75.0, 80.0, 7.5),
        student("Karthik Raj", None, "CS105", "1", 88.0, 85.0, 90.0, 8.8),
        student("Emily Davis", None, "CS201", "2", 88.0, 91.0, 94.0, 8.9),
        student("Michael Brown", None, "CS202", "2", 65.0, 70.0, 76.0, 6.8),
        student("Sarah Jones", None, "CS301", "3", 95.0, 96.0, 98.0, 9.5),
        student("David Wilson", None, "CS302", "3", 82.0, 85.0, 89.0, 8.0),
        student("James White", None, "CS401", "4", 90.0, 92.0, 95.0, 9.1),
        student("Linda Green", None, "CS402", "4", 88.0, 89.0, 91.0, 8.7),
        student("Robert Black", None, "CS403", "4", 75.0, 78.0, 82.0, 7.8),
    ];
    let mut by_roll: HashMap<String, i64> = HashMap::new();
    for s in roster {
        let created = store.insert_student(s)?;
        by_roll.insert(created.roll_no.clone(), created.id);
    }

    let subjects = [
        ("Mathematics I", "MAT101", "1", "Dr. Rajesh Kumar", 60, "2025-05-15"),
        ("Physics", "PHY101", "1", "Prof. Priya Sharma", 60, "2025-05-14"),
        ("Prog. in C", "CS101", "1", "Dr. Amit Patel", 60, "2025-05-10"),
        ("Data Structures", "CS201", "2", "Dr. Amit Patel", 55, "2025-05-12"),
        ("OOPs", "CS202", "2", "Dr. Rajesh Kumar", 55, "2025-05-11"),
        ("Operating Sys.", "CS203", "2", "Prof. Priya Sharma", 55, "2025-05-13"),
        ("DBMS", "CS301", "3", "Dr. Rajesh Kumar", 50, "2025-05-15"),
        ("Networks", "CS302", "3", "Prof. Priya Sharma", 50, "2025-05-14"),
        ("Cloud Computing", "CS401", "4", "Dr. Amit Patel", 45, "2025-05-12"),
        ("AI & ML", "CS402", "4", "Dr. Rajesh Kumar", 45, "2025-05-10"),
    ];
    let mut by_code: HashMap<&str, i64> = HashMap::new();
    for (name, code, year, staff, total, updated) in subjects {
        let created = store.create_subject(NewSubject {
            name: name.to_string(),
            code: code.to_string(),
            year: year.to_string(),
            staff_id: staff_ids.get(staff).copied().unwrap_or_default(),
            staff_name: staff.to_string(),
            total_students: total,
            last_updated: updated.to_string(),
        })?;
        by_code.insert(code, created.id);
    }

    let marks = [
        ("CS101", "MAT101", 45.0, 48.0, 10.0),
        ("CS101", "PHY101", 40.0, 42.0, 9.0),
        ("CS101", "CS101", 42.0, 45.0, 10.0),
        ("CS102", "MAT101", 35.0, 40.0, 8.0),
        ("CS102", "PHY101", 45.0, 46.0, 10.0),
        ("CS201", "CS201", 44.0, 45.0, 10.0),
        ("CS201", "CS202", 40.0, 42.0, 9.0),
    ];
    let mut records = Vec::new();
    for (roll, code, test1, test2, assignment) in marks {
        let (Some(&student_id), Some(&subject_id)) = (by_roll.get(roll), by_code.get(code)) else {
            continue;
        };
        records.push(MarkRecord {
            student_id,
            subject_id,
            test1,
            test2,
            assignment,
        });
    }
    store.upsert_marks(&records)?;

    let certificates = [
        ("Arun Kumar", "Internship", "TCS", ReviewStatus::Pending, "2024-12-01"),
        ("Sneha Reddy", "Placement", "Infosys", ReviewStatus::Pending, "2024-12-02"),
        ("Rahul Verma", "Internship", "Wipro", ReviewStatus::Approved, "2024-11-28"),
    ];
    for (student_name, kind, company, status, date) in certificates {
        store.insert_certificate(NewCertificate {
            student_name: student_name.to_string(),
            kind: kind.to_string(),
            company: company.to_string(),
            status,
            upload_date: date.to_string(),
        })?;
    }

    let achievements = [
        (
            "CS101",
            1,
            "AI in Healthcare",
            "Presented at IEEE Conference",
            "cert_ieee_2024.pdf",
            "2024-10-15",
            "2024-10-16",
            Some(20),
        ),
        (
            "CS102",
            4,
            "AWS Cloud Practitioner",
            "Completed AWS certification",
            "aws_cert.pdf",
            "2024-09-10",
            "2024-09-11",
            Some(15),
        ),
        (
            "CS101",
            2,
            "Smart City Hackathon",
            "First prize in smart traffic system",
            "hackathon_win.jpg",
            "2024-11-20",
            "2024-11-21",
            None,
        ),
    ];
    for (roll, category_id, title, description, proof, date, uploaded, approved_points) in
        achievements
    {
        let Some(&student_id) = by_roll.get(roll) else {
            continue;
        };
        let created = store.insert_achievement(NewAchievement {
            student_id,
            category_id,
            title: title.to_string(),
            description: description.to_string(),
            proof_file: proof.to_string(),
            achievement_date: date.to_string(),
            uploaded_at: uploaded.to_string(),
        })?;
        if let Some(points) = approved_points {
            store.review_achievement(
                created.id,
                &AchievementReview {
                    status: AchievementStatus::Approved,
                    points_awarded: points,
                    rejection_reason: None,
                },
            )?;
        }
    }

    Ok(())
}
