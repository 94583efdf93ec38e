//! `lodestone status`.

use anyhow::Result;
use console::style;
use reqwest::Client;

use lodestone::config::Config;
use lodestone::status::{self, ServiceStatus, StatusMonitor};
use lodestone::ui::icons::{OFFLINE, ONLINE, UNKNOWN};

fn print_status(url: &str, status: ServiceStatus) {
    let (icon, label) = match status {
        ServiceStatus::Online => (ONLINE, style(status.to_string()).green()),
        ServiceStatus::Offline => (OFFLINE, style(status.to_string()).red()),
        ServiceStatus::Unknown => (UNKNOWN, style(status.to_string()).dim()),
    };
    println!("{}{} {}", icon, label, style(url).dim());
}

pub async fn cmd_status(config: &Config, watch: bool) -> Result<()> {
    let Some(url) = config.status_ping_url() else {
        println!(
            "No status endpoint configured. Set [status] ping_url in {}",
            config.config_path.display()
        );
        return Ok(());
    };

    if !watch {
        let status = status::ping(&Client::new(), url).await;
        print_status(url, status);
        return Ok(());
    }

    let monitor = StatusMonitor::spawn(url, config.status_interval());
    let mut rx = monitor.subscribe();
    print_status(url, monitor.current());
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = *rx.borrow_and_update();
                print_status(url, status);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
