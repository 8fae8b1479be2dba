//! `hclaudit onboard` — First-time setup.

use std::path::Path;

use hclaudit_config::AppConfig;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = super::config_file(config_path);

    println!("🏭 hclaudit — First-Time Setup");
    println!("==============================\n");

    if let Some(dir) = config_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created config directory: {}", dir.display());
        } else {
            println!("  Config directory exists: {}", dir.display());
        }
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Export GEMINI_API_KEY (or add api_key to {})", config_path.display());
    println!("   2. Set [data].dir to the folder with the matrix CSVs and the DTI image");
    println!("   3. Run: hclaudit doctor");
    println!("   4. Run: hclaudit serve\n");

    println!("🎉 Setup complete!\n");

    Ok(())
}
