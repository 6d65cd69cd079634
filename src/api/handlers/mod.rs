pub mod root;
pub mod auth;
pub mod notices;
pub mod approvals;
pub mod engagement;
pub mod notifications;
pub mod admin;
