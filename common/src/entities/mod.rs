pub mod audit_log;
pub mod comment;
pub mod role;
pub mod ticket;
pub mod user;
