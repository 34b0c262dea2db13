pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub const DEFAULT_TEMPERATURE: f32 = 0.6;
pub const TEMPERATURE_MIN: f32 = 0.0;
pub const TEMPERATURE_MAX: f32 = 1.0;

pub const DEFAULT_MAX_TOKENS: u32 = 800;
pub const MAX_TOKENS_MIN: u32 = 128;
pub const MAX_TOKENS_MAX: u32 = 4096;

pub const SPEECH_RATE_MIN: f32 = 0.5;
pub const SPEECH_RATE_MAX: f32 = 1.5;
pub const SPEECH_PITCH_MIN: f32 = 0.5;
pub const SPEECH_PITCH_MAX: f32 = 2.0;
pub const SPEECH_VOLUME_MIN: f32 = 0.0;
pub const SPEECH_VOLUME_MAX: f32 = 1.0;

pub const CONNECT_TIMEOUT_SECS: u64 = 5;
pub const READ_TIMEOUT_SECS: u64 = 120;
pub const PREFLIGHT_READ_TIMEOUT_SECS: u64 = 10;
