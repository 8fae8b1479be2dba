//! `hclaudit config` — Configuration management commands.

use std::path::Path;

use hclaudit_config::AppConfig;
use hclaudit_matrix::EnvironmentReport;

pub async fn validate(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load(config_path) {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();

            if !super::credentials_ready(&config) {
                warnings.push("No API key set (set GEMINI_API_KEY or HCLAUDIT_API_KEY)".to_string());
            }

            if config.gateway.host == "0.0.0.0" {
                warnings.push("Dashboard bound to 0.0.0.0 — it has no authentication".to_string());
            }

            let missing = EnvironmentReport::inspect(&config.data).missing_required();
            if !missing.is_empty() {
                warnings.push(format!("{} matrix file(s) missing in data dir", missing.len()));
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Provider:  {}", config.provider);
            println!("   Model:     {}", config.model);
            println!("   Data dir:  {}", config.data.dir.display());
            for m in &config.data.matrices {
                println!("   Matrix:    {} ← {}", m.label, m.file);
            }
            println!(
                "   Gateway:   {}:{}",
                config.gateway.host, config.gateway.port
            );
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;
    if config.api_key.is_some() {
        config.api_key = Some("***".into());
    }
    for provider in config.providers.values_mut() {
        if provider.api_key.is_some() {
            provider.api_key = Some("***".into());
        }
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", super::config_file(config_path).display());
    Ok(())
}
