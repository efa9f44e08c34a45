use crate::config::{ConfigStore, Credentials, SettingKey};
use crate::ui;
use anyhow::Result;
use cliclack::{input, log, note, password};
use colored::*;

/// Prompts for the three OAuth application credentials and stores them.
pub fn run_setup(store: &dyn ConfigStore) -> Result<Credentials> {
    ui::print_banner();
    log::info("Register an app at https://developer.ticktick.com to get these values.")?;

    let client_id: String = input("Client ID")
        .placeholder("from the TickTick developer console")
        .interact()?;

    let client_secret: String = password("Client Secret").mask('•').interact()?;

    let redirect_uri: String = input("Redirect URI")
        .placeholder("e.g. http://localhost:8080/callback")
        .interact()?;

    let credentials = Credentials {
        client_id: client_id.trim().to_string(),
        client_secret: client_secret.trim().to_string(),
        redirect_uri: redirect_uri.trim().to_string(),
    };

    store.set(SettingKey::ClientId, &credentials.client_id)?;
    store.set(SettingKey::ClientSecret, &credentials.client_secret)?;
    store.set(SettingKey::RedirectUri, &credentials.redirect_uri)?;

    log::success("Credentials saved.")?;

    note(
        "Next steps",
        format!(
            "1. Get the authorization URL:  {}\n2. Exchange the code:          {}\n3. Or just open the TUI:        {}",
            "ticktick-tui auth login".cyan(),
            "ticktick-tui auth token <code>".cyan(),
            "ticktick-tui".cyan()
        ),
    )?;

    Ok(credentials)
}
