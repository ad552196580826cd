//! Configuration view and validation commands: `docket config`.

use anyhow::Result;
use docket::config::{CONFIG_FILE, DocketConfig, DocketToml};
use std::path::Path;

use super::super::ConfigCommands;

pub fn cmd_config(
    work_dir: &Path,
    config: &DocketConfig,
    command: Option<ConfigCommands>,
) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Docket Configuration");
            println!("====================");
            println!();

            match config.path {
                Some(ref path) => println!("Config file: {}", path.display()),
                None => println!("No {} found, using defaults", CONFIG_FILE),
            }
            println!();

            let toml = &config.toml;
            println!("[collection]");
            println!("  sort = \"{}\"", toml.collection.sort);
            println!();
            println!("[resolver]");
            println!("  create_missing = {}", toml.resolver.create_missing);
            println!("  redirect_to_first = {}", toml.resolver.redirect_to_first);
            println!();
            println!("[pagination]");
            println!("  page_size = {}", toml.pagination.page_size);
            println!();
            println!("[logging]");
            println!("  level = \"{}\"", toml.logging.level);
            println!("  format = \"{}\"", toml.logging.format);
            println!();

            println!("Effective values (with env/CLI overrides):");
            println!("  page_size = {}", config.page_size());
            println!("  log_level = \"{}\"", config.log_level());
            println!("  log_format = \"{}\"", config.log_format());
            println!();

            if config.path.is_none() {
                println!("Run 'docket config init' to create a {} file.", CONFIG_FILE);
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let problems = config.validate();
            if problems.is_empty() {
                if config.path.is_none() {
                    println!("No {} found. Using defaults (valid).", CONFIG_FILE);
                } else {
                    println!("Configuration is valid.");
                }
                println!();
                return Ok(());
            }

            println!("Configuration problems:");
            for problem in &problems {
                println!("  - {}", problem);
            }
            println!();
            anyhow::bail!("{} configuration problem(s) found", problems.len());
        }
        Some(ConfigCommands::Init) => {
            let config_path = work_dir.join(CONFIG_FILE);
            if config_path.exists() {
                println!("{} already exists at {}", CONFIG_FILE, config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            DocketToml::default().save(&config_path)?;

            println!("Created {} at {}", CONFIG_FILE, config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [collection] sort");
            println!("  - [resolver] create_missing, redirect_to_first");
            println!("  - [pagination] page_size");
            println!("  - [logging] level, format");
            println!();
        }
    }

    Ok(())
}
