pub mod application;
pub mod domain;
pub mod gateway;
pub mod infra;
pub mod observability;
