//! Stateless repository structs, one per table.

mod alert_repo;
mod sign_in_code_repo;
mod trigger_repo;
mod user_repo;

pub use alert_repo::AlertRepo;
pub use sign_in_code_repo::SignInCodeRepo;
pub use trigger_repo::TriggerRepo;
pub use user_repo::UserRepo;
