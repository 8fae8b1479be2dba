//! `hclaudit serve` — Start the dashboard server.

use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    port_override: Option<u16>,
    host_override: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }
    if let Some(host) = host_override {
        config.gateway.host = host;
    }

    println!("🏭 hclaudit dashboard");
    println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Data dir:  {}", config.data.dir.display());
    println!("   Model:     {} ({})", config.model, config.provider);

    hclaudit_gateway::start(config).await?;

    Ok(())
}
