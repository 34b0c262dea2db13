// Speech playout planning.
//
// Audio rendering is the job of an external collaborator (the browser's
// speech API in the original UI). This module only shapes what that
// collaborator consumes: plain text, a BCP-47 language tag, and numeric
// rate/pitch/volume. Last-start-wins cancellation is the player's
// capability and is not modelled here.

use crate::constants::{
    SPEECH_PITCH_MAX, SPEECH_PITCH_MIN, SPEECH_RATE_MAX, SPEECH_RATE_MIN, SPEECH_VOLUME_MAX,
    SPEECH_VOLUME_MIN,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Korean,
    English,
}

impl Lang {
    /// BCP-47 tag understood by speech synthesis backends.
    pub fn tag(&self) -> &'static str {
        match self {
            Lang::Korean => "ko-KR",
            Lang::English => "en-US",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechStyle {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for SpeechStyle {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

impl SpeechStyle {
    pub fn normalize(&mut self) {
        if !self.rate.is_finite() {
            self.rate = 1.0;
        }
        if !self.pitch.is_finite() {
            self.pitch = 1.0;
        }
        if !self.volume.is_finite() {
            self.volume = 1.0;
        }
        self.rate = self.rate.clamp(SPEECH_RATE_MIN, SPEECH_RATE_MAX);
        self.pitch = self.pitch.clamp(SPEECH_PITCH_MIN, SPEECH_PITCH_MAX);
        self.volume = self.volume.clamp(SPEECH_VOLUME_MIN, SPEECH_VOLUME_MAX);
    }
}

/// Per-language playout styles, one per supported answer language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    pub korean: SpeechStyle,
    pub english: SpeechStyle,
}

impl SpeechSettings {
    pub fn normalize(&mut self) {
        self.korean.normalize();
        self.english.normalize();
    }

    pub fn style_for(&self, lang: Lang) -> SpeechStyle {
        match lang {
            Lang::Korean => self.korean,
            Lang::English => self.english,
        }
    }
}

/// One ready-to-play utterance for the external speech collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

pub fn plan_utterance(text: &str, lang: Lang, settings: &SpeechSettings) -> Utterance {
    let style = settings.style_for(lang);
    Utterance {
        text: text.to_string(),
        lang: lang.tag().to_string(),
        rate: style.rate,
        pitch: style.pitch,
        volume: style.volume,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lang_tags() {
        assert_eq!(Lang::Korean.tag(), "ko-KR");
        assert_eq!(Lang::English.tag(), "en-US");
    }

    #[test]
    fn normalize_clamps_style_ranges() {
        let mut style = SpeechStyle {
            rate: 9.0,
            pitch: 0.0,
            volume: -1.0,
        };
        style.normalize();
        assert_eq!(style.rate, SPEECH_RATE_MAX);
        assert_eq!(style.pitch, SPEECH_PITCH_MIN);
        assert_eq!(style.volume, SPEECH_VOLUME_MIN);
    }

    #[test]
    fn normalize_repairs_non_finite_values() {
        let mut style = SpeechStyle {
            rate: f32::NAN,
            pitch: f32::INFINITY,
            volume: 0.5,
        };
        style.normalize();
        assert_eq!(style.rate, 1.0);
        assert_eq!(style.pitch, 1.0);
        assert_eq!(style.volume, 0.5);
    }

    #[test]
    fn utterance_carries_per_language_style() {
        let mut settings = SpeechSettings::default();
        settings.korean.rate = 1.2;
        settings.english.rate = 0.8;
        let kr = plan_utterance("안녕", Lang::Korean, &settings);
        assert_eq!(kr.lang, "ko-KR");
        assert_eq!(kr.rate, 1.2);
        let en = plan_utterance("hello", Lang::English, &settings);
        assert_eq!(en.lang, "en-US");
        assert_eq!(en.rate, 0.8);
    }
}
