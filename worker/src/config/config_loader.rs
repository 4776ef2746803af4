use anyhow::{Ok, Result};

use super::config_model::{Cron, Database, DotEnvyConfig, WhatsApp, WorkerServer};

/// Webhook reconciliation sweeps every six hours unless overridden.
const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 21_600;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let worker_server = WorkerServer {
        port: std::env::var("SERVER_PORT_WORKER")
            .expect("SERVER_PORT_WORKER is invalid")
            .parse()?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let cron = Cron {
        secret: std::env::var("CRON_SECRET").expect("CRON_SECRET is invalid"),
        reconcile_interval_secs: std::env::var("RECONCILE_INTERVAL_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_RECONCILE_INTERVAL_SECS),
    };

    let whatsapp = WhatsApp {
        api_base_url: std::env::var("WHATSAPP_API_BASE_URL")
            .expect("WHATSAPP_API_BASE_URL is invalid"),
        automation_webhook_url: std::env::var("AUTOMATION_WEBHOOK_URL")
            .expect("AUTOMATION_WEBHOOK_URL is invalid"),
    };

    Ok(DotEnvyConfig {
        worker_server,
        database,
        cron,
        whatsapp,
    })
}
