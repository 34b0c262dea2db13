// Answer synthesis: prompt construction, one remote completion call, and
// deterministic splitting of the response into labelled candidates.

pub mod error;
pub mod keyring;
pub mod parse;
pub mod prompt;
pub mod provider;

use error::SynthError;
use parse::{split_candidates, CandidateSet};
use prompt::{build_prompt, AnswerFormat, SYSTEM_PROMPT};
use provider::{canned_answer, AnswerProvider, CompletionRequest, ProviderFactory};
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct SynthOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub format: AnswerFormat,
    /// Substitute a canned bilingual answer on transport failure so the
    /// transcript still advances. Other failure kinds always propagate.
    pub offline_fallback: bool,
}

pub struct Synthesizer {
    provider: Box<dyn AnswerProvider>,
}

impl Synthesizer {
    pub fn new(provider: Box<dyn AnswerProvider>) -> Self {
        Self { provider }
    }

    pub fn create(provider_id: &str, endpoint: &str) -> Result<Self, SynthError> {
        Ok(Self::new(ProviderFactory::create(provider_id, endpoint)?))
    }

    pub fn provider_id(&self) -> &'static str {
        self.provider.id()
    }

    pub fn preflight(&self, api_key: &str) -> Result<(), SynthError> {
        self.provider.preflight(api_key)
    }

    /// One user question in, one labelled candidate set out.
    pub fn synthesize(
        &self,
        question: &str,
        options: &SynthOptions,
        api_key: &str,
    ) -> Result<CandidateSet, SynthError> {
        let request = self.build_request(question, options);
        let start = Instant::now();
        let raw = match self.provider.complete(&request, api_key) {
            Ok(raw) => raw,
            Err(err) => self.substitute_offline(err, options)?,
        };
        debug!(
            "synthesis completed in {} ms ({} chars)",
            start.elapsed().as_millis(),
            raw.len()
        );
        Ok(split_candidates(&raw, options.format))
    }

    /// Streaming variant: deltas go to `on_delta` for live display, but the
    /// candidate split always runs on the assembled full text.
    pub fn synthesize_streaming(
        &self,
        question: &str,
        options: &SynthOptions,
        api_key: &str,
        on_delta: &mut dyn FnMut(&str),
    ) -> Result<CandidateSet, SynthError> {
        let request = self.build_request(question, options);
        let raw = match self
            .provider
            .complete_streaming(&request, api_key, on_delta)
        {
            Ok(raw) => raw,
            Err(err) => self.substitute_offline(err, options)?,
        };
        Ok(split_candidates(&raw, options.format))
    }

    fn build_request(&self, question: &str, options: &SynthOptions) -> CompletionRequest {
        CompletionRequest {
            model: options.model.clone(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            system: SYSTEM_PROMPT.to_string(),
            user: build_prompt(question, options.format),
        }
    }

    fn substitute_offline(
        &self,
        err: SynthError,
        options: &SynthOptions,
    ) -> Result<String, SynthError> {
        match err {
            SynthError::Transport(detail) if options.offline_fallback => {
                warn!("transport failure, serving canned answer: {}", detail);
                Ok(canned_answer(options.format).to_string())
            }
            other => Err(other),
        }
    }
}
