//! Account commands: `lodestone login`, `logout` and `accounts`.

use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::{Input, Password, theme::ColorfulTheme};
use std::sync::Arc;

use lodestone::account::AccountKind;
use lodestone::auth::{AuthGateway, HttpAuthProvider};
use lodestone::config::Config;
use lodestone::errors::AuthError;
use lodestone::ui::icons::{CHECK, USER};
use lodestone::ui::print_failure;

use super::super::AccountsCommands;
use super::open_settings;

pub(crate) fn gateway(config: &Config) -> Result<AuthGateway> {
    let provider = HttpAuthProvider::new(config.auth_base_url())
        .context("Failed to create auth client")?;
    Ok(AuthGateway::new(Arc::new(provider)))
}

pub async fn cmd_login(config: &Config, email: Option<String>, code: Option<String>) -> Result<()> {
    let mut settings = open_settings(config)?;
    let gateway = gateway(config)?;
    let theme = ColorfulTheme::default();

    let email = match email {
        Some(email) => email,
        None => Input::<String>::with_theme(&theme)
            .with_prompt("Email")
            .interact_text()?,
    };
    let password = Password::with_theme(&theme)
        .with_prompt("Password")
        .interact()?;

    let mut code = code;
    loop {
        match gateway
            .authenticate(&mut settings, &email, &password, code.as_deref())
            .await
        {
            Ok(account) => {
                println!(
                    "{}Logged in as {}",
                    CHECK,
                    style(&account.display_name).bold()
                );
                return Ok(());
            }
            Err(AuthError::RequiresTwoFactor) if code.is_none() => {
                let prompt = AuthError::RequiresTwoFactor.displayable();
                println!("{}", style(&prompt.title).yellow().bold());
                code = Some(
                    Input::<String>::with_theme(&theme)
                        .with_prompt(prompt.desc)
                        .interact_text()?,
                );
            }
            Err(e) => {
                print_failure(&e.displayable());
                bail!("Login failed");
            }
        }
    }
}

pub async fn cmd_logout(config: &Config, uuid: Option<String>) -> Result<()> {
    let mut settings = open_settings(config)?;
    let Some(account) = (match uuid {
        Some(uuid) => settings.accounts().get(&uuid).cloned(),
        None => settings.accounts().selected().cloned(),
    }) else {
        bail!("No such account. Run 'lodestone accounts' to list stored accounts.");
    };

    let gateway = gateway(config)?;
    if account.kind == AccountKind::Legacy {
        gateway.remove_legacy_account(&mut settings, &account.uuid)?;
    } else {
        gateway.deauthenticate(&mut settings, &account.uuid).await?;
    }
    println!("{}Logged out {}", CHECK, style(&account.display_name).bold());
    Ok(())
}

pub fn cmd_accounts(config: &Config, command: Option<AccountsCommands>) -> Result<()> {
    let mut settings = open_settings(config)?;

    match command {
        None | Some(AccountsCommands::List) => {
            if settings.accounts().is_empty() {
                println!("No accounts. Run 'lodestone login' to add one.");
                return Ok(());
            }
            let selected = settings.accounts().selected().map(|a| a.uuid.clone());
            for account in settings.accounts().iter() {
                let marker = if selected.as_deref() == Some(account.uuid.as_str()) {
                    style("*").green().bold().to_string()
                } else {
                    " ".to_string()
                };
                let kind = match account.kind {
                    AccountKind::Current => String::new(),
                    AccountKind::Legacy => style(" (legacy)").dim().to_string(),
                };
                println!(
                    "{} {}{} {}{}",
                    marker,
                    USER,
                    style(&account.display_name).bold(),
                    style(&account.uuid).dim(),
                    kind
                );
            }
        }
        Some(AccountsCommands::Select { uuid }) => {
            if !settings.accounts_mut().select(&uuid) {
                bail!("No stored account with id {uuid}");
            }
            settings.save()?;
            println!("{}Selected {}", CHECK, uuid);
        }
    }
    Ok(())
}
