mod config;
mod layer;
mod notifier;
mod ops_webhook;

use std::sync::Arc;

use anyhow::Result;
use config::ObservabilityConfig;
use layer::ErrorAlertLayer;
use notifier::Alerter;
use ops_webhook::OpsWebhookSink;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt,
};

pub fn init_observability(component: &str) -> Result<()> {
    let config = ObservabilityConfig::from_env(component);

    let alert_layer = config.ops_alert.as_ref().map(|ops| {
        let alerter = Alerter::new(vec![Arc::new(OpsWebhookSink::new(ops.webhook_url.clone()))]);

        ErrorAlertLayer::new(alerter, config.service_context.clone(), ops.min_level).with_filter(
            tracing_subscriber::filter::LevelFilter::from_level(ops.min_level),
        )
    });

    // RUST_LOG wins; default stays at `info` so production never runs TRACE.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Local time in log timestamps so the configured TZ shows its offset.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(alert_layer)
        .with(env_filter)
        .try_init()?;

    for warning in &config.warnings {
        warn!(
            service = %config.service_context.service_name,
            environment = %config.service_context.environment,
            component = %config.service_context.component,
            warning = %warning,
            "Observability config warning"
        );
    }

    if config.ops_alert.is_some() {
        info!(
            service = %config.service_context.service_name,
            component = %config.service_context.component,
            "Ops error alerts enabled"
        );
    } else {
        info!(
            service = %config.service_context.service_name,
            component = %config.service_context.component,
            "Ops error alerts disabled"
        );
    }

    Ok(())
}
