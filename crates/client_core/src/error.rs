use thiserror::Error;

/// Local, user-correctable problems found before a trip is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Trip name is required")]
    NameRequired,
    #[error("Add at least one location")]
    NoStops,
}

impl ValidationError {
    /// Draft field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::NameRequired => "name",
            Self::NoStops => "stops",
        }
    }
}

/// Any failed call to the trip service.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{operation}: request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{operation}: server responded {status}: {message}")]
    Status {
        operation: &'static str,
        status: u16,
        message: String,
    },
    #[error("{operation}: invalid response body: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{operation}: trip service is unavailable")]
    Unavailable { operation: &'static str },
}

impl CollaboratorError {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Transport { operation, .. }
            | Self::Status { operation, .. }
            | Self::Decode { operation, .. }
            | Self::Unavailable { operation } => operation,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to create trip")]
    Creation(#[source] CollaboratorError),
}

