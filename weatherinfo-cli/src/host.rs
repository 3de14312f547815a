//! Terminal implementations of the platform collaborators.
//!
//! "Location services", the permission grant and the settings screens all
//! live in the config file; settings navigation is queued here and carried
//! out by the command loop in `cli.rs`.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use weatherinfo_core::{
    Config, Consent, LocationError, LocationFix, LocationServiceState, LocationSource,
    PermissionState, Platform, Priority, Prompt, PromptKind, SettingsTarget,
    platform::{
        DisplaySurface, LocationSubsystem, PermissionSubsystem, PromptPresenter,
        SettingsNavigator,
    },
};

const IP_LOOKUP_URL: &str = "http://ip-api.com/json";

#[derive(Debug)]
pub struct HostState {
    pub config: Config,
    config_path: PathBuf,
    pending_settings: Option<SettingsTarget>,
}

pub type SharedHost = Arc<Mutex<HostState>>;

impl HostState {
    pub fn shared(config: Config, config_path: PathBuf) -> SharedHost {
        Arc::new(Mutex::new(Self { config, config_path, pending_settings: None }))
    }

    pub fn take_pending_settings(&mut self) -> Option<SettingsTarget> {
        self.pending_settings.take()
    }

    /// Write the current config back to disk.
    pub fn persist(&self) -> anyhow::Result<()> {
        self.config.save_to(&self.config_path)
    }
}

pub fn platform(host: &SharedHost) -> Platform {
    Platform {
        location: Box::new(TerminalLocation::new(Arc::clone(host))),
        permissions: Box::new(TerminalPermissions(Arc::clone(host))),
        settings: Box::new(TerminalSettings(Arc::clone(host))),
        prompts: Box::new(TerminalPrompts),
        display: Box::new(TerminalDisplay::default()),
    }
}

pub struct TerminalLocation {
    host: SharedHost,
    http: Client,
    lookup_url: String,
}

impl TerminalLocation {
    pub fn new(host: SharedHost) -> Self {
        Self::with_lookup_url(host, IP_LOOKUP_URL)
    }

    pub fn with_lookup_url(host: SharedHost, lookup_url: &str) -> Self {
        Self { host, http: Client::new(), lookup_url: lookup_url.to_string() }
    }

    async fn lookup_ip(&self) -> Result<Option<LocationFix>, LocationError> {
        let res = self.http.get(&self.lookup_url).send().await?;

        let status = res.status();
        if !status.is_success() {
            return Err(LocationError::Unavailable(format!(
                "IP lookup returned status {status}"
            )));
        }

        let body: IpApiResponse = res.json().await?;
        match body {
            IpApiResponse { status, lat: Some(lat), lon: Some(lon), .. } if status == "success" => {
                Ok(Some(LocationFix::new(lat, lon)))
            }
            IpApiResponse { message, .. } => {
                tracing::debug!(?message, "IP lookup gave no position");
                Ok(None)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

#[async_trait]
impl LocationSubsystem for TerminalLocation {
    fn services_state(&self) -> LocationServiceState {
        if self.host.lock().config.location.enabled {
            LocationServiceState::Enabled
        } else {
            LocationServiceState::Disabled
        }
    }

    async fn current_fix(&self, priority: Priority) -> Result<Option<LocationFix>, LocationError> {
        let source = self.host.lock().config.location.source;
        tracing::debug!(?source, ?priority, "requesting location fix");

        match source {
            LocationSource::Fixed { latitude, longitude } => {
                Ok(Some(LocationFix::new(latitude, longitude)))
            }
            LocationSource::IpLookup => self.lookup_ip().await,
        }
    }
}

pub struct TerminalPermissions(SharedHost);

#[async_trait]
impl PermissionSubsystem for TerminalPermissions {
    fn state(&self) -> PermissionState {
        self.0.lock().config.location.consent.into()
    }

    fn should_show_rationale(&self) -> bool {
        self.0.lock().config.location.consent == Some(Consent::Denied)
    }

    async fn request(&self) -> PermissionState {
        let answer = tokio::task::spawn_blocking(|| {
            inquire::Confirm::new("Allow weatherinfo to use your approximate location?")
                .with_default(true)
                .prompt()
        })
        .await;

        let consent = match answer {
            Ok(Ok(true)) => Consent::Granted,
            Ok(Ok(false)) => Consent::Denied,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "permission prompt failed, treating as denied");
                Consent::Denied
            }
            Err(err) => {
                tracing::warn!(error = %err, "permission prompt task failed, treating as denied");
                Consent::Denied
            }
        };

        let mut host = self.0.lock();
        host.config.location.consent = Some(consent);
        if let Err(err) = host.persist() {
            tracing::warn!(error = %err, "could not store location consent");
        }

        Some(consent).into()
    }
}

pub struct TerminalSettings(SharedHost);

impl SettingsNavigator for TerminalSettings {
    fn open(&self, target: SettingsTarget) {
        self.0.lock().pending_settings = Some(target);
    }
}

pub struct TerminalPrompts;

impl PromptPresenter for TerminalPrompts {
    fn present(&self, kind: PromptKind) -> Box<dyn Prompt> {
        Box::new(TerminalPrompt { kind })
    }
}

/// Answered by the command loop, which reads it from the screen.
struct TerminalPrompt {
    kind: PromptKind,
}

impl Prompt for TerminalPrompt {
    fn kind(&self) -> PromptKind {
        self.kind
    }

    fn dismiss(&mut self) {}
}

#[derive(Debug, Default)]
pub struct TerminalDisplay {
    loading: AtomicBool,
}

impl DisplaySurface for TerminalDisplay {
    fn show_text(&self, text: &str) {
        println!("{text}");
    }

    fn show_loading(&self) {
        if !self.loading.swap(true, Ordering::SeqCst) {
            eprintln!("Loading...");
        }
    }

    fn hide_loading(&self) {
        self.loading.store(false, Ordering::SeqCst);
    }

    fn notify(&self, message: &str) {
        eprintln!("! {message}");
    }
}
