use std::env;

use tracing::Level;
use url::Url;

#[derive(Clone)]
pub(crate) struct ServiceContext {
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
}

#[derive(Clone)]
pub(crate) struct OpsAlertConfig {
    pub(crate) webhook_url: Url,
    pub(crate) min_level: Level,
}

#[derive(Clone)]
pub(crate) struct ObservabilityConfig {
    pub(crate) service_context: ServiceContext,
    pub(crate) ops_alert: Option<OpsAlertConfig>,
    /// Parse problems surfaced after tracing is up instead of silently
    /// disabling the sink.
    pub(crate) warnings: Vec<String>,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        let component = component.trim().to_string();

        let service_name = env::var("SERVICE_NAME")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| component.clone());

        let environment = env::var("STAGE")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "unknown".to_string());

        let (ops_alert, warnings) = ops_alert_from_env();

        Self {
            service_context: ServiceContext {
                service_name,
                environment,
                component,
            },
            ops_alert,
            warnings,
        }
    }
}

fn ops_alert_from_env() -> (Option<OpsAlertConfig>, Vec<String>) {
    let mut warnings = Vec::new();

    let webhook_url = match env::var("OPS_ALERT_WEBHOOK_URL").ok().filter(|v| !v.is_empty()) {
        Some(raw) => match Url::parse(&raw) {
            Ok(url) => url,
            Err(err) => {
                // Alert webhook URLs carry secrets; log the error only.
                warnings.push(format!(
                    "OPS_ALERT_WEBHOOK_URL is set but invalid; ops alerts disabled (parse error: {err})"
                ));
                return (None, warnings);
            }
        },
        None => return (None, warnings),
    };

    let min_level = match env::var("OPS_ALERT_LEVEL") {
        Ok(raw) if !raw.trim().is_empty() => match parse_level(&raw) {
            Some(level) => level,
            None => {
                warnings.push(format!(
                    "OPS_ALERT_LEVEL is invalid (value: {raw}); defaulting to ERROR"
                ));
                Level::ERROR
            }
        },
        _ => Level::ERROR,
    };

    (
        Some(OpsAlertConfig {
            webhook_url,
            min_level,
        }),
        warnings,
    )
}

fn parse_level(input: &str) -> Option<Level> {
    match input.trim().to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
