//! Location-acquisition and permission-negotiation state machine.
//!
//! [`transition`] is pure: it maps `(state, event)` to the next state plus
//! the single [`Effect`] the caller must perform. Performing effects (showing
//! prompts, talking to the platform, fetching weather) is the job of
//! [`crate::screen::WeatherScreen`].

use crate::{
    error::Failure,
    model::{LocationFix, LocationServiceState, PermissionState},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlowState {
    Start,
    /// Services are off and the enable-location prompt is showing.
    ServicesDisabled,
    CheckPermission,
    /// Permission was denied before; the rationale prompt is showing.
    ShowRationale,
    RequestPermission,
    RequestFix,
    /// The user was sent to system settings. Only a resume moves on.
    AwaitingSettings(SettingsTarget),
    FixAcquired(LocationFix),
    Abandoned(Failure),
}

impl FlowState {
    pub fn fix(&self) -> Option<LocationFix> {
        match self {
            FlowState::FixAcquired(fix) => Some(*fix),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::FixAcquired(_) | FlowState::Abandoned(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlowEvent {
    /// The screen became active (first start or return from elsewhere).
    Resumed,
    ServicesObserved(LocationServiceState),
    PermissionObserved { state: PermissionState, rationale: bool },
    PromptConfirmed,
    PromptCancelled,
    PermissionResult(PermissionState),
    FixResult(Option<LocationFix>),
    FixFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    EnableLocation,
    PermissionRationale,
}

impl PromptKind {
    pub fn message(&self) -> &'static str {
        match self {
            PromptKind::EnableLocation => {
                "Your location provider is turned off. Please turn it on for this app to work."
            }
            PromptKind::PermissionRationale => {
                "It Looks like you have turned off permissions required for this feature. \
                 It can be enabled under Application Settings"
            }
        }
    }

    pub fn confirm_label(&self) -> &'static str {
        match self {
            PromptKind::EnableLocation => "Turn On",
            PromptKind::PermissionRationale => "GO TO SETTINGS",
        }
    }

    pub fn cancel_label(&self) -> Option<&'static str> {
        match self {
            PromptKind::EnableLocation => None,
            PromptKind::PermissionRationale => Some("Cancel"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsTarget {
    LocationSource,
    AppDetails,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    None,
    CheckServices,
    QueryPermission,
    Present(PromptKind),
    RequestPermission,
    RequestFix,
    OpenSettings(SettingsTarget),
    Notify(Failure),
    Fetch(LocationFix),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub next: FlowState,
    pub effect: Effect,
}

impl Transition {
    fn to(next: FlowState, effect: Effect) -> Self {
        Self { next, effect }
    }

    fn stay(state: FlowState) -> Self {
        Self { next: state, effect: Effect::None }
    }
}

pub fn transition(state: FlowState, event: FlowEvent) -> Transition {
    use FlowEvent as E;
    use FlowState as S;

    match (state, event) {
        // A stored fix makes acquisition idempotent.
        (S::FixAcquired(_), E::Resumed) => Transition::stay(state),
        (_, E::Resumed) => Transition::to(S::Start, Effect::CheckServices),

        (S::Start, E::ServicesObserved(LocationServiceState::Disabled)) => Transition::to(
            S::ServicesDisabled,
            Effect::Present(PromptKind::EnableLocation),
        ),
        (S::Start, E::ServicesObserved(LocationServiceState::Enabled)) => {
            Transition::to(S::CheckPermission, Effect::QueryPermission)
        }

        (S::ServicesDisabled, E::PromptConfirmed) => Transition::to(
            S::AwaitingSettings(SettingsTarget::LocationSource),
            Effect::OpenSettings(SettingsTarget::LocationSource),
        ),
        (S::ServicesDisabled, E::PromptCancelled) => abandon(Failure::ServicesDisabled),

        (S::CheckPermission, E::PermissionObserved { state, rationale }) => {
            if state.is_granted() {
                Transition::to(S::RequestFix, Effect::RequestFix)
            } else if rationale {
                Transition::to(
                    S::ShowRationale,
                    Effect::Present(PromptKind::PermissionRationale),
                )
            } else {
                Transition::to(S::RequestPermission, Effect::RequestPermission)
            }
        }

        (S::ShowRationale, E::PromptConfirmed) => Transition::to(
            S::AwaitingSettings(SettingsTarget::AppDetails),
            Effect::OpenSettings(SettingsTarget::AppDetails),
        ),
        (S::ShowRationale, E::PromptCancelled) => abandon(Failure::PermissionDenied),

        (S::RequestPermission, E::PermissionResult(result)) => {
            if result.is_granted() {
                Transition::to(S::RequestFix, Effect::RequestFix)
            } else {
                abandon(Failure::PermissionDenied)
            }
        }

        (S::RequestFix, E::FixResult(Some(fix))) => {
            Transition::to(S::FixAcquired(fix), Effect::Fetch(fix))
        }
        (S::RequestFix, E::FixResult(None) | E::FixFailed) => abandon(Failure::FixUnavailable),

        // Late or foreign callbacks do not move the machine.
        (state, _) => Transition::stay(state),
    }
}

fn abandon(failure: Failure) -> Transition {
    Transition::to(FlowState::Abandoned(failure), Effect::Notify(failure))
}
