use crate::speech::Lang;
use serde::{Deserialize, Serialize};

pub const SYSTEM_PROMPT: &str = "You are a bilingual helpful assistant.";

/// How many answer variants one turn requests, and under which markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerFormat {
    /// One Korean and one English answer: `[KR]` / `[EN]`
    Dual,
    /// Short and long Korean answers plus English: `[KR_SHORT]` / `[KR_LONG]` / `[EN]`
    Triple,
}

impl Default for AnswerFormat {
    fn default() -> Self {
        Self::Dual
    }
}

impl AnswerFormat {
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            AnswerFormat::Dual => &["KR", "EN"],
            AnswerFormat::Triple => &["KR_SHORT", "KR_LONG", "EN"],
        }
    }

    /// The literal delimiters the model is instructed to emit, in order.
    pub fn markers(&self) -> &'static [&'static str] {
        match self {
            AnswerFormat::Dual => &["[KR]", "[EN]"],
            AnswerFormat::Triple => &["[KR_SHORT]", "[KR_LONG]", "[EN]"],
        }
    }

    /// First label: the default answer a turn commits when no choice is made.
    pub fn primary_label(&self) -> &'static str {
        self.labels()[0]
    }

    pub fn lang_for_label(label: &str) -> Lang {
        if label.starts_with("EN") {
            Lang::English
        } else {
            Lang::Korean
        }
    }
}

/// Instructs the model to answer once per marker. The markers must survive
/// verbatim in the output; everything else about the wording is free.
pub fn build_prompt(question: &str, format: AnswerFormat) -> String {
    let sections = match format {
        AnswerFormat::Dual => {
            "[KR]\n(Write a clear, concise answer in Korean.)\n\n\
             [EN]\n(Write a clear, concise answer in English.)"
        }
        AnswerFormat::Triple => {
            "[KR_SHORT]\n(Answer in one or two Korean sentences.)\n\n\
             [KR_LONG]\n(Write a detailed answer in Korean.)\n\n\
             [EN]\n(Write a clear, concise answer in English.)"
        }
    };
    format!(
        "User question: {}\n\nYou MUST answer in the following format:\n\n{}\n",
        question.trim(),
        sections
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dual_prompt_contains_question_and_markers() {
        let prompt = build_prompt("What is Rust?", AnswerFormat::Dual);
        assert!(prompt.contains("User question: What is Rust?"));
        assert!(prompt.contains("[KR]"));
        assert!(prompt.contains("[EN]"));
    }

    #[test]
    fn triple_prompt_contains_all_markers() {
        let prompt = build_prompt("hi", AnswerFormat::Triple);
        for marker in AnswerFormat::Triple.markers() {
            assert!(prompt.contains(marker), "missing {}", marker);
        }
    }

    #[test]
    fn markers_match_labels() {
        for format in [AnswerFormat::Dual, AnswerFormat::Triple] {
            assert_eq!(format.labels().len(), format.markers().len());
            for (label, marker) in format.labels().iter().zip(format.markers()) {
                assert_eq!(*marker, format!("[{}]", label));
            }
        }
    }

    #[test]
    fn primary_label_is_first() {
        assert_eq!(AnswerFormat::Dual.primary_label(), "KR");
        assert_eq!(AnswerFormat::Triple.primary_label(), "KR_SHORT");
    }

    #[test]
    fn label_language_mapping() {
        assert_eq!(AnswerFormat::lang_for_label("KR"), Lang::Korean);
        assert_eq!(AnswerFormat::lang_for_label("KR_LONG"), Lang::Korean);
        assert_eq!(AnswerFormat::lang_for_label("EN"), Lang::English);
    }
}
