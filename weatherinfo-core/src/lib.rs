//! Core library for the `weatherinfo` app.
//!
//! This crate defines:
//! - The location/permission flow as a pure state machine
//! - The screen runtime that drives the flow against platform collaborators
//! - The OpenWeather fetch client (raw response body, no parsing)
//! - Configuration & credentials handling
//!
//! It is used by `weatherinfo-cli`, but any host that implements the
//! [`platform`] traits can drive a [`WeatherScreen`].

pub mod config;
pub mod error;
pub mod fetch;
pub mod flow;
pub mod model;
pub mod platform;
pub mod prompt;
pub mod screen;

pub use config::{Config, Consent, LocationConfig, LocationSource};
pub use error::{
    FETCH_FAILED_TEXT, Failure, FetchError, LOCATION_FAILED_TEXT, LocationError, RefreshError,
};
pub use fetch::{OpenWeatherClient, WeatherFetcher};
pub use flow::{FlowState, PromptKind, SettingsTarget};
pub use model::{
    LocationFix, LocationServiceState, PermissionState, Priority, Units, WeatherQuery,
};
pub use platform::Platform;
pub use prompt::Prompt;
pub use screen::{PromptResponse, QuerySettings, WeatherScreen};
