pub mod alert;
pub mod sign_in_code;
pub mod trigger;
pub mod user;
