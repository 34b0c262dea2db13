use crate::synth::error::SynthError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Application-wide error types with categories for better error handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    /// Credential errors (missing/invalid API key, keyring failures)
    Credential(String),

    /// Answer synthesis errors (remote generation failed)
    Synthesis(String),

    /// Provider-side throttling
    RateLimit(String),

    /// Network errors (connect/timeout to the generation service)
    Network(String),

    /// Settings/key-store persistence errors
    Storage(String),

    /// Generic errors that don't fit other categories
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Credential(msg) => write!(f, "Credential Error: {}", msg),
            AppError::Synthesis(msg) => write!(f, "Synthesis Error: {}", msg),
            AppError::RateLimit(msg) => write!(f, "Rate Limit: {}", msg),
            AppError::Network(msg) => write!(f, "Network Error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage Error: {}", msg),
            AppError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Returns a user-friendly title for the error
    pub fn title(&self) -> &str {
        match self {
            AppError::Credential(_) => "API Key Problem",
            AppError::Synthesis(_) => "Generation Failed",
            AppError::RateLimit(_) => "Rate Limited",
            AppError::Network(_) => "Network Problem",
            AppError::Storage(_) => "Storage Error",
            AppError::Other(_) => "Error",
        }
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        match self {
            AppError::Credential(msg)
            | AppError::Synthesis(msg)
            | AppError::RateLimit(msg)
            | AppError::Network(msg)
            | AppError::Storage(msg)
            | AppError::Other(msg) => msg,
        }
    }

    /// Returns whether this error is recoverable within the session
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Credential(_) => false, // Needs a new key
            AppError::Synthesis(_) => true,   // Next turn may succeed
            AppError::RateLimit(_) => true,   // Retry later
            AppError::Network(_) => true,     // Network might recover
            AppError::Storage(_) => true,     // Might be transient disk issue
            AppError::Other(_) => false,
        }
    }

    /// Returns a suggested action for the user
    pub fn suggested_action(&self) -> Option<&str> {
        match self {
            AppError::Credential(_) => Some("Replace the stored API key and try again"),
            AppError::Synthesis(_) => Some("Ask again; the turn was not recorded"),
            AppError::RateLimit(_) => Some("Wait a moment before the next question"),
            AppError::Network(_) => Some("Check your internet connection"),
            AppError::Storage(_) => Some("Check disk space and permissions"),
            AppError::Other(_) => None,
        }
    }
}

impl From<String> for AppError {
    fn from(error: String) -> Self {
        AppError::Other(error)
    }
}

impl From<&str> for AppError {
    fn from(error: &str) -> Self {
        AppError::Other(error.to_string())
    }
}

impl From<SynthError> for AppError {
    fn from(error: SynthError) -> Self {
        match &error {
            SynthError::MissingApiKey(_) | SynthError::InvalidApiKey(_) | SynthError::Auth(_) => {
                AppError::Credential(error.to_string())
            }
            SynthError::RateLimited(_) => AppError::RateLimit(error.to_string()),
            SynthError::Transport(_) => AppError::Network(error.to_string()),
            SynthError::UnknownProvider(_) | SynthError::Unclassified(_) => {
                AppError::Synthesis(error.to_string())
            }
        }
    }
}
