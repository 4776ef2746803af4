#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub worker_server: WorkerServer,
    pub database: Database,
    pub cron: Cron,
    pub whatsapp: WhatsApp,
}

#[derive(Debug, Clone)]
pub struct WorkerServer {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Cron {
    pub secret: String,
    pub reconcile_interval_secs: u64,
}

#[derive(Debug, Clone)]
pub struct WhatsApp {
    pub api_base_url: String,
    pub automation_webhook_url: String,
}
