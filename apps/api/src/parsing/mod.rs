//! Resume parsing through an ordered fallback chain of LLM backends.
//!
//! Each backend is tried in turn. A backend counts as failed when the call
//! errors, the output is not a JSON object matching [`ParsedResume`], or the
//! output has no candidate name; only then is the next backend asked.

pub mod confidence;
pub mod models;
pub mod prompts;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::LlmConfig;
use crate::llm_client::{CompletionBackend, LlmClient, LlmError, GROQ_API_URL, OPENAI_API_URL};
use models::ParsedResume;

pub const GROQ_PRIMARY_MODEL: &str = "llama-3.1-8b-instant";
pub const GROQ_FALLBACK_MODEL: &str = "llama-3.3-70b-versatile";
pub const OPENAI_MODEL: &str = "gpt-4o-mini";

const GROQ_MAX_PROMPT_CHARS: usize = 4000;
const OPENAI_MAX_PROMPT_CHARS: usize = 6000;

#[derive(Debug, Clone, Serialize)]
pub struct ParseOutcome {
    pub resume: ParsedResume,
    /// The model's JSON object as returned, including keys `resume` drops.
    pub raw: Value,
    /// Label of the backend that produced `resume`.
    pub model: String,
    pub confidence: f64,
    /// Backends tried, including the successful one.
    pub attempts: usize,
}

pub struct ResumeParser {
    backends: Vec<Arc<dyn CompletionBackend>>,
}

impl ResumeParser {
    pub fn new(backends: Vec<Arc<dyn CompletionBackend>>) -> Self {
        Self { backends }
    }

    /// Groq models first (when `GROQ_API_KEY` is set), then OpenAI.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let mut backends: Vec<Arc<dyn CompletionBackend>> = Vec::new();
        if let Some(key) = &config.groq_api_key {
            for model in [GROQ_PRIMARY_MODEL, GROQ_FALLBACK_MODEL] {
                backends.push(Arc::new(LlmClient::new(
                    "Groq",
                    GROQ_API_URL,
                    key.clone(),
                    model,
                    GROQ_MAX_PROMPT_CHARS,
                )?));
            }
        }
        if let Some(key) = &config.openai_api_key {
            backends.push(Arc::new(LlmClient::new(
                "OpenAI",
                OPENAI_API_URL,
                key.clone(),
                OPENAI_MODEL,
                OPENAI_MAX_PROMPT_CHARS,
            )?));
        }
        if backends.is_empty() {
            warn!("No LLM API keys configured; resume parsing will fail");
        }
        Ok(Self::new(backends))
    }

    pub fn labels(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.label()).collect()
    }

    pub async fn parse_resume(&self, resume_text: &str) -> Result<ParseOutcome, LlmError> {
        if self.backends.is_empty() {
            return Err(LlmError::NoProviders);
        }

        let prompt = prompts::build_resume_prompt(resume_text);
        let mut failures = Vec::new();

        for (index, backend) in self.backends.iter().enumerate() {
            let label = backend.label();
            match try_backend(backend.as_ref(), &prompt).await {
                Ok((resume, raw)) => {
                    let confidence = confidence::confidence_for(&resume);
                    info!(model = %label, confidence, "Resume parsed");
                    return Ok(ParseOutcome {
                        resume,
                        raw,
                        model: label,
                        confidence,
                        attempts: index + 1,
                    });
                }
                Err(e) => {
                    warn!("{label} failed to parse resume, trying next model: {e}");
                    failures.push(format!("{label}: {e}"));
                }
            }
        }

        Err(LlmError::Exhausted { attempts: failures })
    }
}

async fn try_backend(
    backend: &dyn CompletionBackend,
    prompt: &str,
) -> Result<(ParsedResume, Value), LlmError> {
    let text = backend.complete(prompt).await?;
    decode_resume(&text)
}

/// Decodes model output and rejects results without a candidate name.
/// Returns the typed resume alongside the untouched JSON object.
pub fn decode_resume(text: &str) -> Result<(ParsedResume, Value), LlmError> {
    let value: Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(LlmError::InvalidOutput("expected a JSON object".into()));
    }
    let resume = ParsedResume::deserialize(&value)?;
    if resume.name().is_none() {
        return Err(LlmError::InvalidOutput("full_name is missing".into()));
    }
    Ok((resume, value))
}
