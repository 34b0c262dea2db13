// Splitting one model response into labelled answer sections.
//
// The markers are literal substrings; a marker counts only if it appears
// after the previous one, so a reordered or partially honored format
// degrades to "whole text under the first label" instead of producing
// garbled sections. Malformed output is never an error here.

use super::prompt::AnswerFormat;
use crate::speech::Lang;
use serde::{Deserialize, Serialize};

/// Shown as the primary answer when the model returned nothing usable.
pub const EMPTY_ANSWER_FALLBACK: &str =
    "(답변을 생성하지 못했습니다 / Could not generate an answer.)";

/// All answer variants produced for one user turn, ordered as the format's
/// labels. Non-primary sections may be empty; the primary never is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSet {
    format: AnswerFormat,
    sections: Vec<String>,
}

impl CandidateSet {
    pub fn format(&self) -> AnswerFormat {
        self.format
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.format.labels()
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.format
            .labels()
            .iter()
            .position(|l| *l == label)
            .map(|idx| self.sections[idx].as_str())
    }

    /// Text of the first (default) label.
    pub fn primary(&self) -> &str {
        &self.sections[0]
    }

    pub fn lang_of(&self, label: &str) -> Lang {
        AnswerFormat::lang_for_label(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.format
            .labels()
            .iter()
            .zip(self.sections.iter())
            .map(|(label, text)| (*label, text.as_str()))
    }

    #[cfg(test)]
    pub(crate) fn from_sections(format: AnswerFormat, sections: Vec<String>) -> Self {
        assert_eq!(sections.len(), format.labels().len());
        Self { format, sections }
    }
}

/// Split raw model output into one section per marker.
///
/// Markers are searched in template order, each occurrence strictly after
/// the previous marker. A section runs from the end of its marker to the
/// start of the next one (or end of text) and is whitespace-trimmed.
///
/// Fallbacks, in order:
/// - any marker missing or out of order → whole trimmed text under the
///   first label, all others empty;
/// - nothing left after trimming (including "all sections empty") → the
///   fixed fallback message under the first label.
pub fn split_candidates(raw: &str, format: AnswerFormat) -> CandidateSet {
    let markers = format.markers();
    let count = markers.len();

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return fallback_set(format);
    }

    // Locate every marker, in order.
    let mut starts = Vec::with_capacity(count);
    let mut cursor = 0usize;
    for marker in markers {
        match raw[cursor..].find(marker) {
            Some(rel) => {
                let at = cursor + rel;
                starts.push(at);
                cursor = at + marker.len();
            }
            None => {
                // Whole text degrades to the first label.
                let mut sections = vec![String::new(); count];
                sections[0] = trimmed.to_string();
                return CandidateSet { format, sections };
            }
        }
    }

    let mut sections = Vec::with_capacity(count);
    for idx in 0..count {
        let begin = starts[idx] + markers[idx].len();
        let end = if idx + 1 < count {
            starts[idx + 1]
        } else {
            raw.len()
        };
        sections.push(raw[begin..end].trim().to_string());
    }

    if sections.iter().all(|s| s.is_empty()) {
        return fallback_set(format);
    }

    CandidateSet { format, sections }
}

fn fallback_set(format: AnswerFormat) -> CandidateSet {
    let mut sections = vec![String::new(); format.labels().len()];
    sections[0] = EMPTY_ANSWER_FALLBACK.to_string();
    CandidateSet { format, sections }
}
