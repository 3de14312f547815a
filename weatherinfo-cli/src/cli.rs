use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::Select;
use std::fmt;
use weatherinfo_core::{Config, PromptKind, PromptResponse, SettingsTarget, WeatherScreen};

use crate::{
    host::{self, HostState, SharedHost},
    setup,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherinfo", version, about = "Current weather for where you are")]
pub struct Cli {
    /// Log flow transitions and requests to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key, units and location source.
    Configure,

    /// Locate this machine and show the current weather.
    Show {
        /// Exit after the first result instead of offering a refresh menu.
        #[arg(long)]
        once: bool,
    },

    /// Forget whether location access was allowed.
    ResetPermission,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => {
                let path = Config::config_file_path()?;
                let mut config = Config::load_from(&path)?;
                config = blocking(move || {
                    setup::configure(&mut config)?;
                    Ok(config)
                })
                .await?;
                config.save_to(&path)?;
                println!("Saved configuration to {}", path.display());
            }
            Command::Show { once } => show(once).await?,
            Command::ResetPermission => {
                let path = Config::config_file_path()?;
                let mut config = Config::load_from(&path)?;
                config.location.consent = None;
                config.save_to(&path)?;
                println!("Location access will be asked for again on the next `weatherinfo show`.");
            }
        }

        Ok(())
    }
}

/// Run an interactive terminal step off the async runtime's threads.
async fn blocking<T, F>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.context("Interactive prompt task failed")?
}

async fn show(once: bool) -> anyhow::Result<()> {
    let path = Config::config_file_path()?;
    let config = Config::load_from(&path)?;
    let query = config.query_settings()?;
    let client = config.weather_client()?;

    let host = HostState::shared(config, path);
    let mut screen = WeatherScreen::new(host::platform(&host), Box::new(client), query);

    screen.on_resume().await;
    settle(&mut screen, &host, setup::ask, setup::edit_settings).await?;

    if once || screen.last_fix().is_none() {
        return Ok(());
    }

    loop {
        let action = blocking(|| {
            Select::new("What next?", MenuAction::ALL.to_vec())
                .prompt()
                .context("Failed to read menu choice")
        })
        .await?;

        match action {
            MenuAction::Refresh => {
                if let Err(err) = screen.refresh().await {
                    tracing::debug!(error = %err, "refresh failed");
                }
            }
            MenuAction::Quit => return Ok(()),
        }
    }
}

/// Answer prompts and carry out settings navigation until the flow waits
/// for nothing but the user's next command.
async fn settle<A, E>(
    screen: &mut WeatherScreen,
    host: &SharedHost,
    ask: A,
    edit: E,
) -> anyhow::Result<()>
where
    A: Fn(PromptKind) -> anyhow::Result<PromptResponse> + Clone + Send + 'static,
    E: Fn(SettingsTarget, &mut Config) -> anyhow::Result<()> + Clone + Send + 'static,
{
    loop {
        let pending = host.lock().take_pending_settings();
        if let Some(target) = pending {
            open_settings(host, target, edit.clone()).await?;
            screen.on_resume().await;
            continue;
        }

        if let Some(kind) = screen.visible_prompt() {
            let ask = ask.clone();
            let response = blocking(move || ask(kind)).await?;
            screen.on_prompt_response(response).await;
            continue;
        }

        return Ok(());
    }
}

async fn open_settings<E>(host: &SharedHost, target: SettingsTarget, edit: E) -> anyhow::Result<()>
where
    E: Fn(SettingsTarget, &mut Config) -> anyhow::Result<()> + Send + 'static,
{
    let mut config = host.lock().config.clone();
    let config = blocking(move || {
        edit(target, &mut config)?;
        Ok(config)
    })
    .await?;

    let mut state = host.lock();
    state.config = config;
    state.persist()
}

#[derive(Debug, Clone, Copy)]
enum MenuAction {
    Refresh,
    Quit,
}

impl MenuAction {
    const ALL: [MenuAction; 2] = [MenuAction::Refresh, MenuAction::Quit];
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuAction::Refresh => f.write_str("Refresh"),
            MenuAction::Quit => f.write_str("Quit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use weatherinfo_core::{
        Consent, FlowState, LocationFix, LocationSource, OpenWeatherClient, QuerySettings, Units,
    };
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn show_parses_once_flag() {
        let cli = Cli::try_parse_from(["weatherinfo", "show", "--once"]).unwrap();
        assert!(matches!(cli.command, Command::Show { once: true }));
        assert!(!cli.verbose);
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["weatherinfo", "reset-permission", "-v"]).unwrap();
        assert!(matches!(cli.command, Command::ResetPermission));
        assert!(cli.verbose);
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["weatherinfo", "forecast"]).is_err());
    }

    #[tokio::test]
    async fn settle_enables_services_through_settings_and_resumes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"temp":27}"#))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.set_api_key("KEY".to_string());
        config.location.enabled = false;
        config.location.consent = Some(Consent::Granted);
        config.location.source = LocationSource::Fixed { latitude: 12.9, longitude: 77.6 };

        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let host = HostState::shared(config, config_path.clone());

        let client = OpenWeatherClient::with_base_url(&server.uri()).unwrap();
        let query = QuerySettings { units: Units::Metric, api_key: "KEY".to_string() };
        let mut screen = WeatherScreen::new(host::platform(&host), Box::new(client), query);
        screen.on_resume().await;
        assert_eq!(screen.state(), FlowState::ServicesDisabled);

        let asked = Arc::new(Mutex::new(Vec::new()));
        let edited = Arc::new(Mutex::new(Vec::new()));

        let ask = {
            let asked = Arc::clone(&asked);
            move |kind: PromptKind| {
                asked.lock().push(kind);
                Ok(PromptResponse::Confirmed)
            }
        };
        let edit = {
            let edited = Arc::clone(&edited);
            move |target: SettingsTarget, config: &mut Config| {
                edited.lock().push(target);
                config.location.enabled = true;
                Ok(())
            }
        };

        settle(&mut screen, &host, ask, edit).await.unwrap();

        assert_eq!(screen.state(), FlowState::FixAcquired(LocationFix::new(12.9, 77.6)));
        assert_eq!(*asked.lock(), vec![PromptKind::EnableLocation]);
        assert_eq!(*edited.lock(), vec![SettingsTarget::LocationSource]);
        assert!(host.lock().config.location.enabled);

        let saved = Config::load_from(&config_path).unwrap();
        assert!(saved.location.enabled);
    }
}
