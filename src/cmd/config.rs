//! Configuration view and validation commands: `lodestone config`.

use anyhow::Result;

use lodestone::config::Config;
use lodestone::launcher_config::LauncherToml;

use super::super::ConfigCommands;

pub fn cmd_config(config: &Config, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = &config.config_path;

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Lodestone Configuration");
            println!("=======================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No launcher.toml found at {}", config_path.display());
                println!("Using default configuration.");
            }
            println!();

            let toml = config.toml();
            println!("[auth]");
            println!("  base_url = \"{}\"", toml.auth.base_url);
            println!();

            println!("[news]");
            if let Some(url) = &toml.news.feed_url {
                println!("  feed_url = \"{}\"", url);
            }
            if let Some(host) = &toml.news.host {
                println!("  host = \"{}\"", host);
            }
            println!("  timeout_ms = {}", toml.news.timeout_ms);
            println!("  default_author = \"{}\"", toml.news.default_author);
            println!();

            if toml.distribution.url.is_some() || toml.distribution.selected_server.is_some() {
                println!("[distribution]");
                if let Some(url) = &toml.distribution.url {
                    println!("  url = \"{}\"", url);
                }
                if let Some(server) = &toml.distribution.selected_server {
                    println!("  selected_server = \"{}\"", server);
                }
                println!();
            }

            println!("[status]");
            if let Some(url) = &toml.status.ping_url {
                println!("  ping_url = \"{}\"", url);
            }
            println!("  interval_secs = {}", toml.status.interval_secs);
            println!();

            // Show effective values (including env/CLI overrides)
            println!("Effective values (with env/CLI overrides):");
            println!("  auth_base_url = \"{}\"", config.auth_base_url());
            match config.distribution_url() {
                Some(url) => println!("  distribution_url = \"{}\"", url),
                None => println!("  distribution_url = (none)"),
            }
            println!("  data_dir = \"{}\"", config.data_dir.display());
            println!("  log_dir = \"{}\"", config.log_dir.display());
            println!();

            if !config_path.exists() {
                println!("Run 'lodestone config init' to create a launcher.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No launcher.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = LauncherToml::load(config_path)?;
            let warnings = toml.validate();

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
                println!("launcher.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            LauncherToml::default().save(config_path)?;

            println!("Created launcher.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [auth] base_url");
            println!("  - [distribution] url, selected_server");
            println!("  - [news] feed_url, host");
            println!("  - [status] ping_url, interval_secs");
            println!();
        }
    }

    Ok(())
}
