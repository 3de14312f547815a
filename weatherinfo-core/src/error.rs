//! Error types shared by the flow, the fetch client and the screen.

/// Why a cycle of the location/weather flow ended without weather.
///
/// Every variant is terminal for the current cycle but never fatal; its
/// `Display` text is the short notice shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    #[error("Location services are turned off")]
    ServicesDisabled,
    #[error("Permission denied for location")]
    PermissionDenied,
    #[error("Cannot get location.")]
    FixUnavailable,
    #[error("failed the response code is {0}")]
    Http(u16),
    #[error("failed")]
    Transport,
}

impl Failure {
    /// Text that replaces the main display region, if this failure owns it.
    pub fn display_text(&self) -> Option<&'static str> {
        match self {
            Failure::FixUnavailable => Some(LOCATION_FAILED_TEXT),
            Failure::Http(_) | Failure::Transport => Some(FETCH_FAILED_TEXT),
            Failure::ServicesDisabled | Failure::PermissionDenied => None,
        }
    }
}

pub const FETCH_FAILED_TEXT: &str = "Failed ! Please try again";
pub const LOCATION_FAILED_TEXT: &str = "Failed to get Location ! Please try again";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("weather request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("weather request could not be completed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid weather endpoint: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<&FetchError> for Failure {
    fn from(err: &FetchError) -> Self {
        match err.status() {
            Some(status) => Failure::Http(status),
            None => Failure::Transport,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("location unavailable: {0}")]
    Unavailable(String),
    #[error("location lookup failed: {0}")]
    Lookup(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("No location yet. Please allow location access first.")]
    NoLocationFix,
    #[error(transparent)]
    Failed(#[from] Failure),
}
