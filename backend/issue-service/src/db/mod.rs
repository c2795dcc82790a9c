pub mod banned_email_repo;
pub mod issue_repo;
pub mod user_repo;
