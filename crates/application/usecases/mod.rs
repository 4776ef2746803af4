pub mod authorization;
pub mod campaigns;
pub mod feature_access;
pub mod plan_catalog;
pub mod quota;
pub mod tenant_subscriptions;
pub mod webhook_reconciliation;
