// Selection state machine.
//
// One session owns one transcript and at most one unresolved candidate
// set. Phases: Idle <-> AwaitingSelection. No timers; transitions happen
// only through the calls below. Each connection/shell owns its own
// `ChatSession` value; there is no process-wide session.

use crate::synth::parse::CandidateSet;
use crate::transcript::{Message, Transcript};
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    AwaitingSelection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No candidate set awaits a decision
    NoPendingSelection,
    /// Label is not part of the pending set's format
    UnknownLabel(String),
    /// The candidate under this label is blank; the set stays pending
    EmptyCandidate(String),
    /// Questions must be non-empty after trimming
    EmptyQuestion,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NoPendingSelection => {
                write!(f, "No candidate answers are awaiting selection")
            }
            SessionError::UnknownLabel(label) => write!(f, "Unknown answer label: {}", label),
            SessionError::EmptyCandidate(label) => {
                write!(f, "The {} candidate is empty; pick another", label)
            }
            SessionError::EmptyQuestion => write!(f, "Question must not be empty"),
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Debug, Default)]
pub struct ChatSession {
    transcript: Transcript,
    pending: Option<CandidateSet>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.pending.is_some() {
            SessionPhase::AwaitingSelection
        } else {
            SessionPhase::Idle
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&CandidateSet> {
        self.pending.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Appends the user message for a new turn. A still-unresolved set
    /// from the previous turn is resolved first by committing its default
    /// answer, so a turn never ends answerless and two sets never coexist.
    pub fn record_question(&mut self, question: &str) -> Result<(), SessionError> {
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return Err(SessionError::EmptyQuestion);
        }
        if self.pending.is_some() {
            debug!("new question with unresolved candidates, committing default");
            let _ = self.commit_default();
        }
        self.transcript.push(Message::user(trimmed));
        Ok(())
    }

    /// Stores a fresh candidate set and enters AwaitingSelection. Any
    /// prior set is unreachable from this point on.
    pub fn accept_candidates(&mut self, set: CandidateSet) {
        if self.pending.is_some() {
            debug!("replacing unresolved candidate set");
        }
        info!("candidate set pending ({} labels)", set.labels().len());
        self.pending = Some(set);
    }

    /// Resolves the pending set: appends exactly one assistant message
    /// with the chosen candidate and returns to Idle. Refused selections
    /// leave the set pending so another label can still be chosen.
    pub fn select(&mut self, label: &str) -> Result<Message, SessionError> {
        let set = self
            .pending
            .as_ref()
            .ok_or(SessionError::NoPendingSelection)?;
        let text = set
            .get(label)
            .ok_or_else(|| SessionError::UnknownLabel(label.to_string()))?;
        if text.is_empty() {
            return Err(SessionError::EmptyCandidate(label.to_string()));
        }
        let message = Message::assistant(text.to_string(), set.lang_of(label));
        self.pending = None;
        self.transcript.push(message.clone());
        info!("candidate '{}' committed to transcript", label);
        Ok(message)
    }

    /// Commits the default answer: the primary label, or the first
    /// non-empty one if the primary came back blank.
    pub fn commit_default(&mut self) -> Result<Message, SessionError> {
        let label = {
            let set = self
                .pending
                .as_ref()
                .ok_or(SessionError::NoPendingSelection)?;
            set.iter()
                .find(|(_, text)| !text.is_empty())
                .map(|(label, _)| label)
        };
        match label {
            Some(label) => self.select(label),
            None => {
                // Degenerate set with nothing to commit; drop it.
                self.pending = None;
                Err(SessionError::EmptyCandidate("all".to_string()))
            }
        }
    }

    /// Synthesis failed: the turn ends with no assistant entry.
    pub fn abort_turn(&mut self) {
        if self.pending.take().is_some() {
            info!("turn aborted, candidate set discarded");
        }
    }

    /// Clears transcript, candidate set, and pending flag unconditionally.
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.pending = None;
        info!("session reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::Lang;
    use crate::synth::parse::{split_candidates, CandidateSet};
    use crate::synth::prompt::AnswerFormat;
    use crate::transcript::Role;

    fn dual_set(kr: &str, en: &str) -> CandidateSet {
        CandidateSet::from_sections(
            AnswerFormat::Dual,
            vec![kr.to_string(), en.to_string()],
        )
    }

    #[test]
    fn select_appends_exactly_one_message_and_returns_to_idle() {
        let mut session = ChatSession::new();
        session.record_question("hello?").unwrap();
        session.accept_candidates(dual_set("안녕", "Hello"));
        assert_eq!(session.phase(), SessionPhase::AwaitingSelection);

        let before = session.transcript().len();
        let message = session.select("EN").unwrap();
        assert_eq!(message.content, "Hello");
        assert_eq!(message.lang, Some(Lang::English));
        assert_eq!(session.transcript().len(), before + 1);
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(session.pending().is_none());
    }

    #[test]
    fn only_one_candidate_set_is_ever_outstanding() {
        let mut session = ChatSession::new();
        session.accept_candidates(dual_set("first", "first-en"));
        session.accept_candidates(dual_set("second", "second-en"));
        assert_eq!(session.pending().unwrap().primary(), "second");

        // The first set is unreachable: selecting yields the second.
        let message = session.select("KR").unwrap();
        assert_eq!(message.content, "second");
        assert!(session.pending().is_none());
    }

    #[test]
    fn unknown_label_leaves_state_unchanged() {
        let mut session = ChatSession::new();
        session.accept_candidates(dual_set("안녕", "Hello"));
        let err = session.select("FR").unwrap_err();
        assert_eq!(err, SessionError::UnknownLabel("FR".to_string()));
        assert_eq!(session.phase(), SessionPhase::AwaitingSelection);
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn selecting_with_nothing_pending_fails() {
        let mut session = ChatSession::new();
        let err = session.select("KR").unwrap_err();
        assert_eq!(err, SessionError::NoPendingSelection);
    }

    #[test]
    fn empty_candidate_is_refused_and_set_stays_pending() {
        let mut session = ChatSession::new();
        session.accept_candidates(dual_set("only korean", ""));
        let err = session.select("EN").unwrap_err();
        assert_eq!(err, SessionError::EmptyCandidate("EN".to_string()));
        assert!(session.is_pending());

        // The other label still works.
        assert!(session.select("KR").is_ok());
    }

    #[test]
    fn new_question_commits_the_default_answer_first() {
        let mut session = ChatSession::new();
        session.record_question("first?").unwrap();
        session.accept_candidates(dual_set("기본 답", "default answer"));

        session.record_question("second?").unwrap();
        assert!(session.pending().is_none());

        let messages = session.transcript().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "first?");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "기본 답");
        assert_eq!(messages[2].content, "second?");
    }

    #[test]
    fn default_commit_skips_a_blank_primary() {
        let mut session = ChatSession::new();
        session.accept_candidates(dual_set("", "english only"));
        let message = session.commit_default().unwrap();
        assert_eq!(message.content, "english only");
        assert_eq!(message.lang, Some(Lang::English));
    }

    #[test]
    fn abort_discards_the_set_without_an_assistant_entry() {
        let mut session = ChatSession::new();
        session.record_question("hi").unwrap();
        session.accept_candidates(dual_set("a", "b"));
        session.abort_turn();
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.transcript().len(), 1);
    }

    #[test]
    fn reset_clears_everything_from_any_state() {
        let mut session = ChatSession::new();
        session.record_question("hi").unwrap();
        session.accept_candidates(dual_set("a", "b"));
        session.reset();
        assert!(session.transcript().is_empty());
        assert!(!session.is_pending());
        assert_eq!(session.phase(), SessionPhase::Idle);

        // Reset from Idle is also fine.
        session.reset();
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn empty_question_is_rejected() {
        let mut session = ChatSession::new();
        assert_eq!(
            session.record_question("   ").unwrap_err(),
            SessionError::EmptyQuestion
        );
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn parser_output_flows_through_selection() {
        let mut session = ChatSession::new();
        session.record_question("What is Rust?").unwrap();
        let set = split_candidates("[KR]\n러스트입니다\n[EN]\nIt is Rust.", AnswerFormat::Dual);
        session.accept_candidates(set);
        let message = session.select("KR").unwrap();
        assert_eq!(message.content, "러스트입니다");
        assert_eq!(message.lang, Some(Lang::Korean));
    }
}
