pub mod access;
pub mod enums;
pub mod phone;
pub mod plans;
pub mod quota;
pub mod webhooks;
