pub mod config;
pub mod constants;
pub mod errors;
mod paths;
pub mod session;
pub mod speech;
pub mod synth;
pub mod transcript;
mod util;

pub use config::{load_settings, save_settings_file, Settings};
pub use errors::AppError;
pub use session::{ChatSession, SessionError, SessionPhase};
pub use synth::error::SynthError;
pub use synth::parse::CandidateSet;
pub use synth::prompt::AnswerFormat;
pub use synth::{SynthOptions, Synthesizer};

use std::fs;
use std::path::PathBuf;
use tracing::info;

pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    info!("duotalk starting up");
}

/// Seeds missing environment variables from `.env.local` / `.env` next to
/// the working directory (or one level up). Existing variables win.
pub fn load_local_env() {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let parent = cwd.parent().map(|p| p.to_path_buf());
    let mut candidates = vec![cwd.join(".env.local"), cwd.join(".env")];
    if let Some(parent) = parent {
        candidates.push(parent.join(".env.local"));
        candidates.push(parent.join(".env"));
    }

    for path in candidates {
        if !path.exists() {
            continue;
        }
        if let Ok(raw) = fs::read_to_string(&path) {
            for line in raw.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let mut parts = line.splitn(2, '=');
                let key = parts.next().unwrap_or("").trim();
                let value = parts.next().unwrap_or("").trim();
                if key.is_empty() || value.is_empty() {
                    continue;
                }
                if std::env::var(key).is_err() {
                    std::env::set_var(key, value);
                }
            }
        }
    }
}
