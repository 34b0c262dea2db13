use crate::constants::{
  DEFAULT_ENDPOINT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, MAX_TOKENS_MAX,
  MAX_TOKENS_MIN, TEMPERATURE_MAX, TEMPERATURE_MIN,
};
use crate::paths::resolve_config_path;
use crate::speech::SpeechSettings;
use crate::synth::prompt::AnswerFormat;
use crate::synth::SynthOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use url::Url;

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub provider: String, // "openai" | "offline"
  pub endpoint: String,
  pub model: String,
  pub temperature: f32,
  pub max_tokens: u32,
  pub answer_format: AnswerFormat,
  pub streaming: bool,
  pub offline_fallback: bool,
  pub speech: SpeechSettings,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      provider: "openai".to_string(),
      endpoint: DEFAULT_ENDPOINT.to_string(),
      model: DEFAULT_MODEL.to_string(),
      temperature: DEFAULT_TEMPERATURE,
      max_tokens: DEFAULT_MAX_TOKENS,
      answer_format: AnswerFormat::Dual,
      streaming: false,
      offline_fallback: false,
      speech: SpeechSettings::default(),
    }
  }
}

impl Settings {
  /// Repairs out-of-range and malformed values in place. Loaded files and
  /// user edits both pass through here; fields never keep invalid values.
  pub fn normalize(&mut self) {
    let provider = self.provider.trim().to_lowercase();
    self.provider = if provider == "openai" || provider == "offline" {
      provider
    } else {
      "openai".to_string()
    };

    let endpoint = self.endpoint.trim().to_string();
    let valid_endpoint = Url::parse(&endpoint)
      .map(|url| url.scheme() == "http" || url.scheme() == "https")
      .unwrap_or(false);
    self.endpoint = if valid_endpoint {
      endpoint.trim_end_matches('/').to_string()
    } else {
      DEFAULT_ENDPOINT.to_string()
    };

    if self.model.trim().is_empty() {
      self.model = DEFAULT_MODEL.to_string();
    } else {
      self.model = self.model.trim().to_string();
    }

    if !self.temperature.is_finite() {
      self.temperature = DEFAULT_TEMPERATURE;
    }
    self.temperature = self.temperature.clamp(TEMPERATURE_MIN, TEMPERATURE_MAX);

    if self.max_tokens < MAX_TOKENS_MIN {
      self.max_tokens = MAX_TOKENS_MIN;
    }
    if self.max_tokens > MAX_TOKENS_MAX {
      self.max_tokens = MAX_TOKENS_MAX;
    }

    self.speech.normalize();
  }

  /// The synthesizer-facing slice of the settings.
  pub fn synth_options(&self) -> SynthOptions {
    SynthOptions {
      model: self.model.clone(),
      temperature: self.temperature,
      max_tokens: self.max_tokens,
      format: self.answer_format,
      offline_fallback: self.offline_fallback,
    }
  }
}

pub fn load_settings() -> Settings {
  let path = resolve_config_path(SETTINGS_FILE);
  let mut settings: Settings = match fs::read_to_string(path) {
    Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
    Err(_) => Settings::default(),
  };
  settings.normalize();
  settings
}

pub fn save_settings_file(settings: &Settings) -> Result<(), String> {
  let path = resolve_config_path(SETTINGS_FILE);
  let raw = serde_json::to_string_pretty(settings).map_err(|e| e.to_string())?;
  fs::write(path, raw).map_err(|e| e.to_string())?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_are_in_range() {
    let mut settings = Settings::default();
    let before = settings.clone();
    settings.normalize();
    assert_eq!(settings.provider, before.provider);
    assert_eq!(settings.endpoint, before.endpoint);
    assert_eq!(settings.temperature, before.temperature);
    assert_eq!(settings.max_tokens, before.max_tokens);
  }

  #[test]
  fn normalize_clamps_sampling_knobs() {
    let mut settings = Settings {
      temperature: 4.2,
      max_tokens: 7,
      ..Settings::default()
    };
    settings.normalize();
    assert_eq!(settings.temperature, TEMPERATURE_MAX);
    assert_eq!(settings.max_tokens, MAX_TOKENS_MIN);

    settings.max_tokens = 1_000_000;
    settings.temperature = f32::NAN;
    settings.normalize();
    assert_eq!(settings.max_tokens, MAX_TOKENS_MAX);
    assert_eq!(settings.temperature, DEFAULT_TEMPERATURE);
  }

  #[test]
  fn normalize_repairs_bad_provider_and_endpoint() {
    let mut settings = Settings {
      provider: "Gemini".to_string(),
      endpoint: "not a url".to_string(),
      model: "   ".to_string(),
      ..Settings::default()
    };
    settings.normalize();
    assert_eq!(settings.provider, "openai");
    assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
    assert_eq!(settings.model, DEFAULT_MODEL);
  }

  #[test]
  fn normalize_keeps_custom_http_endpoint() {
    let mut settings = Settings {
      endpoint: "http://localhost:11434/v1/".to_string(),
      ..Settings::default()
    };
    settings.normalize();
    assert_eq!(settings.endpoint, "http://localhost:11434/v1");
  }

  #[test]
  fn settings_survive_a_serde_round_trip() {
    let mut settings = Settings::default();
    settings.answer_format = AnswerFormat::Triple;
    settings.speech.korean.rate = 1.2;
    let raw = serde_json::to_string(&settings).unwrap();
    assert!(raw.contains("\"triple\""));
    let loaded: Settings = serde_json::from_str(&raw).unwrap();
    assert_eq!(loaded.answer_format, AnswerFormat::Triple);
    assert_eq!(loaded.speech.korean.rate, 1.2);
  }

  #[test]
  fn unknown_fields_fall_back_to_defaults() {
    let loaded: Settings = serde_json::from_str("{\"temperature\": 0.2}").unwrap();
    assert_eq!(loaded.temperature, 0.2);
    assert_eq!(loaded.model, DEFAULT_MODEL);
  }

  #[test]
  fn synth_options_mirror_settings() {
    let settings = Settings {
      offline_fallback: true,
      answer_format: AnswerFormat::Triple,
      ..Settings::default()
    };
    let options = settings.synth_options();
    assert!(options.offline_fallback);
    assert_eq!(options.format, AnswerFormat::Triple);
    assert_eq!(options.model, settings.model);
  }
}
