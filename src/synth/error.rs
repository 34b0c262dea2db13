use std::fmt;

/// Failure kinds a turn driver must branch on. The synthesizer performs no
/// retries; every variant is surfaced once at the turn boundary.
#[derive(Debug, Clone)]
pub enum SynthError {
    UnknownProvider(String),
    MissingApiKey(String),
    InvalidApiKey(String),
    /// Credential rejected by the service (HTTP 401/403)
    Auth(String),
    /// Provider-side throttling (HTTP 429)
    RateLimited(String),
    /// Connection failure or timeout
    Transport(String),
    /// Anything else, surfaced with the raw message text
    Unclassified(String),
}

impl fmt::Display for SynthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthError::UnknownProvider(provider) => {
                write!(f, "Unknown answer provider: {}", provider)
            }
            SynthError::MissingApiKey(provider) => {
                write!(f, "No API key configured for provider '{}'", provider)
            }
            SynthError::InvalidApiKey(message) => write!(f, "Invalid API key: {}", message),
            SynthError::Auth(message) => {
                write!(f, "Authentication rejected: {}", message)
            }
            SynthError::RateLimited(message) => {
                write!(f, "Rate limit exceeded: {}", message)
            }
            SynthError::Transport(message) => write!(f, "Transport failure: {}", message),
            SynthError::Unclassified(message) => write!(f, "Generation error: {}", message),
        }
    }
}

impl std::error::Error for SynthError {}

impl SynthError {
    /// Transient failures may succeed on the next turn without user action.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SynthError::RateLimited(_) | SynthError::Transport(_)
        )
    }
}
