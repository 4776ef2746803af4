use anyhow::{Ok, Result};

use super::config_model::{Admin, Auth, BackendServer, Database, DotEnvyConfig, WhatsApp};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: std::env::var("SERVER_PORT_BACKEND")
            .expect("SERVER_PORT_BACKEND is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let auth = Auth {
        jwt_secret: std::env::var("AUTH_JWT_SECRET").expect("AUTH_JWT_SECRET is invalid"),
    };

    let admin = Admin {
        allowlist: std::env::var("ADMIN_ALLOWLIST")
            .unwrap_or_default()
            .split(',')
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
            .collect(),
        setup_secret: std::env::var("ADMIN_SETUP_SECRET").expect("ADMIN_SETUP_SECRET is invalid"),
    };

    let whatsapp = WhatsApp {
        api_base_url: std::env::var("WHATSAPP_API_BASE_URL")
            .expect("WHATSAPP_API_BASE_URL is invalid"),
        automation_webhook_url: std::env::var("AUTOMATION_WEBHOOK_URL")
            .expect("AUTOMATION_WEBHOOK_URL is invalid"),
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        auth,
        admin,
        whatsapp,
    })
}

pub fn get_jwt_secret() -> Result<String> {
    dotenvy::dotenv().ok();

    Ok(std::env::var("AUTH_JWT_SECRET").expect("AUTH_JWT_SECRET is invalid"))
}
