use anyhow::Context;
use std::sync::Arc;
use sutro_pool_bridge::config_flow::{self, CredentialsInput};
use sutro_pool_bridge::field::{DeviceInfo, FieldAdapter, FieldValue};
use sutro_pool_bridge::gateway::INTEGRATION_NAME;
use sutro_pool_bridge::{
    BridgeSettings, ConfigEntry, ConfigStore, MemoryConfigStore, PollingCoordinator, Reading,
    SutroAPI, SutroGateway,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Sutro pool bridge");
    let settings = BridgeSettings::from_env()?;
    let api = SutroAPI::new(settings.api_url.clone());
    let store = MemoryConfigStore::default();

    let entry = match settings.token.clone() {
        Some(token) => {
            let entry = ConfigEntry {
                entry_id: if settings.username.is_empty() {
                    "sutro".to_string()
                } else {
                    settings.username.trim().to_lowercase()
                },
                title: INTEGRATION_NAME.to_string(),
                username: settings.username.clone(),
                password: settings.password.clone(),
                token,
                update_interval: settings.update_interval,
            };
            store.save(entry.clone());
            entry
        }
        None => config_flow::setup_entry(
            &api,
            &store,
            CredentialsInput {
                username: settings.username.clone(),
                password: settings.password.clone(),
                update_interval: Some(settings.update_interval),
            },
        )
        .await
        .context("Could not log in to the Sutro service")?,
    };

    let device = DeviceInfo::for_entry(&entry.entry_id);
    info!(
        "Registered device `{}` ({} {})",
        device.name, device.manufacturer, device.model
    );

    let gateway = Arc::new(SutroGateway::new(entry.token.clone(), api));
    let adapters = FieldAdapter::all();
    let entry_id = entry.entry_id.clone();

    let coordinator = PollingCoordinator::builder(gateway)
        .interval(entry.update_interval)
        .on_update(move |reading| log_reading(&entry_id, &adapters, reading))
        .build();

    coordinator.first_refresh().await;
    coordinator
        .start()
        .await
        .context("Sutro polling task stopped")?;

    Ok(())
}

fn log_reading(entry_id: &str, adapters: &[FieldAdapter], reading: &Reading) {
    for adapter in adapters {
        let unique_id = adapter.unique_id(entry_id);
        match adapter.value(reading) {
            Ok(FieldValue::Number(value)) => info!("{unique_id}: {value}"),
            Ok(FieldValue::Timestamp(ts)) => info!("{unique_id}: {}", ts.to_rfc3339()),
            Err(e) => warn!("{unique_id}: {e}"),
        }
    }
}
