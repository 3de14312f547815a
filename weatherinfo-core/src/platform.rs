//! Interfaces to the host platform.
//!
//! The flow never touches the platform directly; a host implements these
//! traits and hands them to [`crate::screen::WeatherScreen`] as a
//! [`Platform`].

use async_trait::async_trait;

use crate::{
    error::LocationError,
    flow::{PromptKind, SettingsTarget},
    model::{LocationFix, LocationServiceState, PermissionState, Priority},
    prompt::Prompt,
};

#[async_trait]
pub trait LocationSubsystem: Send + Sync {
    /// Whether any location provider is currently enabled.
    fn services_state(&self) -> LocationServiceState;

    /// One-shot fix. `Ok(None)` means the platform had no position to give.
    async fn current_fix(&self, priority: Priority) -> Result<Option<LocationFix>, LocationError>;
}

#[async_trait]
pub trait PermissionSubsystem: Send + Sync {
    fn state(&self) -> PermissionState;

    fn should_show_rationale(&self) -> bool;

    /// Ask the user for location access and report the answer.
    async fn request(&self) -> PermissionState;
}

pub trait SettingsNavigator: Send + Sync {
    /// Open a settings screen. The outcome is only observed on the next resume.
    fn open(&self, target: SettingsTarget);
}

pub trait PromptPresenter: Send + Sync {
    /// Show a blocking prompt. The user's answer comes back through
    /// [`crate::screen::WeatherScreen::on_prompt_response`].
    fn present(&self, kind: PromptKind) -> Box<dyn Prompt>;
}

pub trait DisplaySurface: Send + Sync {
    fn show_text(&self, text: &str);

    fn show_loading(&self);

    fn hide_loading(&self);

    /// Short transient notice.
    fn notify(&self, message: &str);
}

/// The set of collaborators one screen talks to.
pub struct Platform {
    pub location: Box<dyn LocationSubsystem>,
    pub permissions: Box<dyn PermissionSubsystem>,
    pub settings: Box<dyn SettingsNavigator>,
    pub prompts: Box<dyn PromptPresenter>,
    pub display: Box<dyn DisplaySurface>,
}

/// Keeps the loading indicator visible for as long as it lives.
pub(crate) struct LoadingIndicator<'a> {
    display: &'a dyn DisplaySurface,
}

impl<'a> LoadingIndicator<'a> {
    pub(crate) fn show(display: &'a dyn DisplaySurface) -> Self {
        display.show_loading();
        Self { display }
    }
}

impl Drop for LoadingIndicator<'_> {
    fn drop(&mut self) {
        self.display.hide_loading();
    }
}
