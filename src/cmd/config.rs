//! Configuration view and validation commands for `orgcompile config`.

use anyhow::Result;
use orgcompile::config::{CONFIG_FILE, CompileToml, Config};
use std::path::PathBuf;

use super::super::{Cli, ConfigCommands};

pub fn cmd_config(cli: &Cli, project_dir: PathBuf, command: Option<ConfigCommands>) -> Result<()> {
    let config = Config::new(project_dir, super::cli_overrides(cli))?;
    let config_path = config.config_path();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("orgcompile Configuration");
            println!("========================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No {} found at {}", CONFIG_FILE, config_path.display());
                println!("Using default configuration.");
            }
            println!();

            let toml = &config.toml;
            println!("[remote]");
            if let Some(cmd) = &toml.remote.sf_cmd {
                println!("  sf_cmd = \"{}\"", cmd);
            }
            println!("  api_version = \"{}\"", toml.remote.api_version);
            if let Some(org) = &toml.remote.target_org {
                println!("  target_org = \"{}\"", org);
            }
            println!();
            println!("[compile]");
            println!("  concurrency = {}", toml.compile.concurrency);
            println!("  poll_interval_ms = {}", toml.compile.poll_interval_ms);
            println!();

            println!("Effective values (with env/CLI overrides):");
            let settings = config.compile_settings();
            println!("  sf_cmd = \"{}\"", config.sf_cmd());
            match config.target_org() {
                Some(org) => println!("  target_org = \"{}\"", org),
                None => println!("  target_org = (CLI default)"),
            }
            println!("  concurrency = {}", settings.concurrency);
            println!("  poll_interval_ms = {}", settings.poll_interval.as_millis());
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No {} found. Using defaults (valid).", CONFIG_FILE);
                return Ok(());
            }

            let warnings = config.toml.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("{} already exists at {}", CONFIG_FILE, config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            std::fs::create_dir_all(&config.config_dir)?;
            CompileToml::default().save(&config_path)?;

            println!("Created {} at {}", CONFIG_FILE, config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [remote] sf_cmd, api_version, target_org");
            println!("  - [compile] concurrency, poll_interval_ms");
            println!();
        }
    }

    Ok(())
}
