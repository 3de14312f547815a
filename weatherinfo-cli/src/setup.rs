//! Interactive editors for the config file: first-time setup and the two
//! "settings screens" the location flow can send the user to.

use anyhow::{Context, Result, bail};
use inquire::{Confirm, CustomType, InquireError, Password, Select};
use std::fmt;
use weatherinfo_core::{
    Config, Consent, LocationSource, PromptKind, PromptResponse, SettingsTarget, Units,
};

pub fn configure(config: &mut Config) -> Result<()> {
    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_help_message("Create one at https://home.openweathermap.org/api_keys")
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }
    config.set_api_key(api_key.trim().to_string());

    let starting_units =
        Units::all().iter().position(|u| *u == config.units).unwrap_or_default();
    config.units = Select::new("Units:", Units::all().to_vec())
        .with_starting_cursor(starting_units)
        .prompt()
        .context("Failed to read units")?;

    config.location.source = match Select::new("Location source:", SourceChoice::ALL.to_vec())
        .prompt()
        .context("Failed to read location source")?
    {
        SourceChoice::IpLookup => LocationSource::IpLookup,
        SourceChoice::Fixed => read_coordinates()?,
    };

    edit_location_services(config)
}

/// Open the settings screen the location flow asked for.
pub fn edit_settings(target: SettingsTarget, config: &mut Config) -> Result<()> {
    match target {
        SettingsTarget::LocationSource => edit_location_services(config),
        SettingsTarget::AppDetails => edit_app_permissions(config),
    }
}

/// The "location source settings" screen.
pub fn edit_location_services(config: &mut Config) -> Result<()> {
    config.location.enabled = Confirm::new("Turn on location services for weatherinfo?")
        .with_default(true)
        .prompt()
        .context("Failed to read location services choice")?;
    Ok(())
}

/// The "application details" screen, where location access can be changed.
pub fn edit_app_permissions(config: &mut Config) -> Result<()> {
    let choice = Select::new("Location access for weatherinfo:", vec![
        ConsentChoice(Consent::Granted),
        ConsentChoice(Consent::Denied),
    ])
    .prompt()
    .context("Failed to read location access choice")?;

    config.location.consent = Some(choice.0);
    Ok(())
}

/// Ask the user to answer a flow prompt.
pub fn ask(kind: PromptKind) -> Result<PromptResponse> {
    let question = question(kind);
    let hint = kind.cancel_label().map(|cancel| format!("Answer 'n' to {}", cancel.to_lowercase()));

    let mut confirm = Confirm::new(&question).with_default(true);
    if let Some(hint) = &hint {
        confirm = confirm.with_help_message(hint);
    }

    match confirm.prompt() {
        Ok(true) => Ok(PromptResponse::Confirmed),
        Ok(false) | Err(InquireError::OperationCanceled) => Ok(PromptResponse::Cancelled),
        Err(err) => Err(err).context("Failed to read prompt answer"),
    }
}

fn question(kind: PromptKind) -> String {
    format!("{}\n{}?", kind.message(), kind.confirm_label())
}

fn read_coordinates() -> Result<LocationSource> {
    let latitude: f64 =
        CustomType::new("Latitude:").prompt().context("Failed to read latitude")?;
    let longitude: f64 =
        CustomType::new("Longitude:").prompt().context("Failed to read longitude")?;

    fixed_source(latitude, longitude)
}

fn fixed_source(latitude: f64, longitude: f64) -> Result<LocationSource> {
    if !(-90.0..=90.0).contains(&latitude) {
        bail!("Latitude must be between -90 and 90, got {latitude}");
    }
    if !(-180.0..=180.0).contains(&longitude) {
        bail!("Longitude must be between -180 and 180, got {longitude}");
    }
    Ok(LocationSource::Fixed { latitude, longitude })
}

#[derive(Debug, Clone, Copy)]
enum SourceChoice {
    IpLookup,
    Fixed,
}

impl SourceChoice {
    const ALL: [SourceChoice; 2] = [SourceChoice::IpLookup, SourceChoice::Fixed];
}

impl fmt::Display for SourceChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceChoice::IpLookup => f.write_str("Approximate (from IP address)"),
            SourceChoice::Fixed => f.write_str("Fixed coordinates"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ConsentChoice(Consent);

impl fmt::Display for ConsentChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Consent::Granted => f.write_str("Allow"),
            Consent::Denied => f.write_str("Don't allow"),
        }
    }
}
