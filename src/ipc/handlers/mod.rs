pub mod achievements;
pub mod attendance;
pub mod certificates;
pub mod core;
pub mod leaderboard;
pub mod leaves;
pub mod reports;
pub mod settings;
pub mod students;
pub mod subjects;
pub mod users;
