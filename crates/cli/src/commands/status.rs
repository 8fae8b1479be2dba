//! `hclaudit status` — Show the effective configuration.

use std::path::Path;

use hclaudit_matrix::EnvironmentReport;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let report = EnvironmentReport::inspect(&config.data);
    let present = report.files.iter().filter(|f| f.required && f.exists).count();
    let required = report.files.iter().filter(|f| f.required).count();

    println!("🏭 hclaudit Status");
    println!("=================");
    println!("  Config file:  {}", super::config_file(config_path).display());
    println!("  Provider:     {}", config.provider);
    println!("  Model:        {}", config.model);
    println!(
        "  Temperature:  {}",
        config
            .temperature
            .map(|t| t.to_string())
            .unwrap_or_else(|| "provider default".into())
    );
    println!("  API key:      {}", if config.has_api_key() { "set" } else { "missing" });
    println!("  Data dir:     {}", config.data.dir.display());
    println!("  Matrices:     {present}/{required} present");
    println!(
        "  DTI:          {}",
        if report.diagram().is_some() { "present" } else { "missing" }
    );
    println!("  Dashboard:    http://{}:{}", config.gateway.host, config.gateway.port);

    if report.chat_ready() && super::credentials_ready(&config) {
        println!("\n  ✅ Chat ready");
    } else {
        println!("\n  ⚠️  Chat blocked — run `hclaudit doctor` for details");
    }

    Ok(())
}
