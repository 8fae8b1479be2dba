//! `hclaudit doctor` — Diagnose data files, configuration and credentials.

use std::path::Path;

use hclaudit_config::AppConfig;
use hclaudit_core::Provider as _;
use hclaudit_matrix::{EnvironmentReport, FileRole, MatrixStore};

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 hclaudit Doctor — System Diagnostics");
    println!("======================================\n");

    let mut issues = 0;

    // Config
    let file = super::config_file(config_path);
    if file.exists() {
        println!("  ✅ Config file found: {}", file.display());
    } else {
        println!("  ⚠️  No config file at {} — using defaults", file.display());
    }

    let config = match AppConfig::load(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. Fix the config and re-run doctor.");
            return Ok(());
        }
    };

    // Data files
    println!("\n  Data directory: {}", config.data.dir.display());
    let report = EnvironmentReport::inspect(&config.data);
    for status in &report.files {
        match (&status.role, status.exists) {
            (FileRole::Matrix { label }, true) => {
                println!("  ✅ Documento listo ({label}): {}", status.name)
            }
            (FileRole::Matrix { label }, false) => {
                println!("  ❌ Falta el archivo ({label}): {}", status.name);
                issues += 1;
            }
            (FileRole::Diagram, true) => println!("  ✅ DTI encontrado: {}", status.name),
            (FileRole::Diagram, false) => {
                println!("  📌 DTI no encontrado (opcional): {}", status.name)
            }
        }
    }

    // Parse check only makes sense when every matrix exists
    if report.chat_ready() {
        let store = MatrixStore::from_config(&config.data);
        match store.matrices().await {
            Ok(matrices) => {
                for m in matrices {
                    println!(
                        "  ✅ {} parsed: {} rows × {} columns",
                        m.label,
                        m.table.len(),
                        m.table.headers.len()
                    );
                }
            }
            Err(e) => {
                println!("  ❌ Matrix data unreadable: {e}");
                issues += 1;
            }
        }
    }

    // Credentials
    println!();
    if super::credentials_ready(&config) {
        if config.has_api_key() {
            println!("  ✅ API key configured for provider '{}'", config.provider);
        } else {
            println!("  ✅ '{}' runs locally, no API key needed", config.provider);
        }
        match hclaudit_providers::build_from_config(&config) {
            Ok(provider) => match provider.health_check().await {
                Ok(true) => println!("  ✅ {} reachable", provider.name()),
                Ok(false) => {
                    println!("  ⚠️  {} rejected the health check (check the key)", provider.name());
                    issues += 1;
                }
                Err(e) => {
                    println!("  ⚠️  {} unreachable: {e}", provider.name());
                    issues += 1;
                }
            },
            Err(e) => {
                println!("  ❌ Provider could not be built: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  ❌ No API key configured — set GEMINI_API_KEY or api_key in config.toml");
        issues += 1;
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
