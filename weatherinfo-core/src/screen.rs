//! The weather screen: runs the location flow against the platform and
//! shows the fetched weather.
//!
//! All state lives in one [`WeatherScreen`]; it is created when the screen
//! is and dropped with it. Every step is awaited in turn, so at most one
//! platform request or weather fetch is ever in flight. Dropping an
//! in-flight call's future abandons it without touching the screen.

use crate::{
    error::{Failure, RefreshError},
    fetch::WeatherFetcher,
    flow::{Effect, FlowEvent, FlowState, PromptKind, Transition, transition},
    model::{LocationFix, Priority, Units, WeatherQuery},
    platform::{LoadingIndicator, Platform},
    prompt::{ActivePrompt, PromptSlot},
};

/// Static part of every weather query.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySettings {
    pub units: Units,
    pub api_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptResponse {
    Confirmed,
    Cancelled,
}

pub struct WeatherScreen {
    state: FlowState,
    prompt: PromptSlot,
    platform: Platform,
    fetcher: Box<dyn WeatherFetcher>,
    query: QuerySettings,
}

impl WeatherScreen {
    pub fn new(platform: Platform, fetcher: Box<dyn WeatherFetcher>, query: QuerySettings) -> Self {
        Self { state: FlowState::Start, prompt: PromptSlot::default(), platform, fetcher, query }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn last_fix(&self) -> Option<LocationFix> {
        self.state.fix()
    }

    pub fn visible_prompt(&self) -> Option<PromptKind> {
        self.prompt.kind()
    }

    pub fn has_visible_prompt(&self) -> bool {
        self.prompt.is_visible()
    }

    /// The screen became active. Restarts the flow unless a fix is stored.
    pub async fn on_resume(&mut self) {
        self.prompt.clear();
        self.dispatch(FlowEvent::Resumed).await;
    }

    /// The user answered the visible prompt.
    pub async fn on_prompt_response(&mut self, response: PromptResponse) {
        if !self.prompt.is_visible() {
            tracing::debug!(?response, "no prompt visible, ignoring response");
            return;
        }
        self.prompt.clear();

        let event = match response {
            PromptResponse::Confirmed => FlowEvent::PromptConfirmed,
            PromptResponse::Cancelled => FlowEvent::PromptCancelled,
        };
        self.dispatch(event).await;
    }

    /// Fetch again with the stored fix. Does not re-run the location flow.
    pub async fn refresh(&mut self) -> Result<(), RefreshError> {
        let Some(fix) = self.last_fix() else {
            tracing::warn!(state = ?self.state, "refresh requested before any location fix");
            self.platform.display.notify(&RefreshError::NoLocationFix.to_string());
            return Err(RefreshError::NoLocationFix);
        };

        self.fetch_and_show(fix).await?;
        Ok(())
    }

    async fn dispatch(&mut self, event: FlowEvent) {
        let mut pending = Some(event);

        while let Some(event) = pending.take() {
            let Transition { next, effect } = transition(self.state, event);
            if next != self.state {
                tracing::debug!(from = ?self.state, to = ?next, ?event, "flow transition");
            }
            self.state = next;
            pending = self.perform(effect).await;
        }
    }

    /// Run one effect; returns the event it produced, if any.
    async fn perform(&mut self, effect: Effect) -> Option<FlowEvent> {
        match effect {
            Effect::None => None,
            Effect::CheckServices => {
                Some(FlowEvent::ServicesObserved(self.platform.location.services_state()))
            }
            Effect::QueryPermission => {
                let permissions = &self.platform.permissions;
                Some(FlowEvent::PermissionObserved {
                    state: permissions.state(),
                    rationale: permissions.should_show_rationale(),
                })
            }
            Effect::Present(kind) => {
                self.prompt.clear();
                let prompt = self.platform.prompts.present(kind);
                self.prompt.show(ActivePrompt::new(prompt));
                None
            }
            Effect::RequestPermission => {
                Some(FlowEvent::PermissionResult(self.platform.permissions.request().await))
            }
            Effect::RequestFix => {
                let _loading = LoadingIndicator::show(self.platform.display.as_ref());
                match self.platform.location.current_fix(Priority::Balanced).await {
                    Ok(fix) => Some(FlowEvent::FixResult(fix)),
                    Err(err) => {
                        tracing::warn!(error = %err, "location fix failed");
                        Some(FlowEvent::FixFailed)
                    }
                }
            }
            Effect::OpenSettings(target) => {
                tracing::debug!(?target, "opening settings");
                self.platform.settings.open(target);
                None
            }
            Effect::Notify(failure) => {
                tracing::warn!(%failure, "location flow abandoned");
                self.report(failure);
                None
            }
            Effect::Fetch(fix) => {
                tracing::info!(lat = fix.latitude, lon = fix.longitude, "location fix acquired");
                if let Err(failure) = self.fetch_and_show(fix).await {
                    tracing::debug!(%failure, "initial weather fetch failed");
                }
                None
            }
        }
    }

    async fn fetch_and_show(&self, fix: LocationFix) -> Result<(), Failure> {
        let query = WeatherQuery::new(fix, self.query.units, self.query.api_key.as_str());
        let display = self.platform.display.as_ref();
        let _loading = LoadingIndicator::show(display);

        match self.fetcher.fetch_weather(&query).await {
            Ok(body) => {
                display.show_text(&body);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "weather fetch failed");
                let failure = Failure::from(&err);
                self.report(failure);
                Err(failure)
            }
        }
    }

    fn report(&self, failure: Failure) {
        let display = self.platform.display.as_ref();
        if let Some(text) = failure.display_text() {
            display.show_text(text);
        }
        display.notify(&failure.to_string());
    }
}

impl std::fmt::Debug for WeatherScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherScreen")
            .field("state", &self.state)
            .field("prompt", &self.prompt)
            .field("fetcher", &self.fetcher)
            .field("units", &self.query.units)
            .finish_non_exhaustive()
    }
}
