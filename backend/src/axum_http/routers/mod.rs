pub mod admin;
pub mod plans;
pub mod quota;
pub mod tenants;
pub mod webhooks;
