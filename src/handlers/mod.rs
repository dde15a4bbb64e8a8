pub mod daily_logs;
pub mod diet;
pub mod health;
pub mod progress;
pub mod users;
