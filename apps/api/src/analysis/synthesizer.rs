//! Resume analysis synthesizer: the fallback chain behind every analysis.
//!
//! Tiers are tried strictly in order, never raced:
//! 1. primary provider (if configured)
//! 2. secondary provider (if configured)
//! 3. heuristic analysis, which cannot fail
//!
//! Each provider call runs under its own deadline so a hung provider cannot
//! starve the tiers after it. Which tier answered is returned for logging and
//! persistence only; the result shape is identical for all three.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::analysis::heuristic::{heuristic_analysis, normalize_job_role};
use crate::analysis::models::ResumeAnalysisResult;
use crate::analysis::normalize::normalize_provider_output;
use crate::analysis::prompts::{analysis_system_prompt, build_analysis_prompt};
use crate::config::{AnalysisSettings, AnalyzerConfig, MalformedOutputPolicy, ProviderConfig};
use crate::llm_client::{ChatProvider, LlmClient, LlmError};

pub const DEFAULT_ANALYSIS_TYPE: &str = "comprehensive";
const LOGGED_RAW_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Primary,
    Secondary,
    Heuristic,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Primary => "primary",
            Tier::Secondary => "secondary",
            Tier::Heuristic => "heuristic",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Synthesis {
    pub result: ResumeAnalysisResult,
    pub tier: Tier,
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("resume text is empty")]
    EmptyResume,

    /// A provider failed in a way no fallback can paper over.
    #[error("External service error: {0}")]
    ExternalService(String),
}

/// One configured provider tier.
#[derive(Clone)]
pub struct ProviderSlot {
    pub name: String,
    pub model: String,
    pub client: Arc<dyn ChatProvider>,
}

impl ProviderSlot {
    pub fn new(name: impl Into<String>, model: impl Into<String>, client: Arc<dyn ChatProvider>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            client,
        }
    }

    fn from_config(provider: &ProviderConfig) -> Result<Self, LlmError> {
        let client = LlmClient::new(provider)?;
        Ok(Self::new(&provider.name, &provider.model, Arc::new(client)))
    }
}

enum Attempt {
    Answered(ResumeAnalysisResult),
    Unavailable,
    Malformed,
}

pub struct Synthesizer {
    primary: Option<ProviderSlot>,
    secondary: Option<ProviderSlot>,
    settings: AnalysisSettings,
}

impl Synthesizer {
    pub fn new(
        settings: AnalysisSettings,
        primary: Option<ProviderSlot>,
        secondary: Option<ProviderSlot>,
    ) -> Self {
        Self {
            primary,
            secondary,
            settings,
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, LlmError> {
        Ok(Self::new(
            config.settings.clone(),
            config.primary.as_ref().map(ProviderSlot::from_config).transpose()?,
            config.secondary.as_ref().map(ProviderSlot::from_config).transpose()?,
        ))
    }

    /// Names of the configured provider tiers, in fallback order.
    pub fn provider_names(&self) -> Vec<&str> {
        [&self.primary, &self.secondary]
            .into_iter()
            .flatten()
            .map(|slot| slot.name.as_str())
            .collect()
    }

    pub async fn analyze(
        &self,
        resume_text: &str,
        job_role: Option<&str>,
        analysis_type: &str,
    ) -> Result<ResumeAnalysisResult, SynthesisError> {
        self.synthesize(resume_text, job_role, analysis_type)
            .await
            .map(|s| s.result)
    }

    /// Runs the fallback chain and reports which tier produced the result.
    pub async fn synthesize(
        &self,
        resume_text: &str,
        job_role: Option<&str>,
        analysis_type: &str,
    ) -> Result<Synthesis, SynthesisError> {
        let resume_text = resume_text.trim();
        if resume_text.is_empty() {
            return Err(SynthesisError::EmptyResume);
        }
        let job_role = normalize_job_role(job_role);
        let analysis_type = match analysis_type.trim() {
            "" => DEFAULT_ANALYSIS_TYPE,
            t => t,
        };

        // Also the defaults for any field a provider leaves out.
        let heuristic = heuristic_analysis(resume_text, &job_role);

        if self.primary.is_none() && self.secondary.is_none() {
            debug!("No AI provider configured, using heuristic analysis");
            return Ok(Synthesis {
                result: heuristic,
                tier: Tier::Heuristic,
            });
        }

        let system = analysis_system_prompt();
        let prompt = build_analysis_prompt(resume_text, &job_role, analysis_type);

        if let Some(slot) = &self.primary {
            match self.attempt(slot, &system, &prompt, &heuristic).await? {
                Attempt::Answered(result) => {
                    info!("Resume analysis produced by primary provider {}", slot.name);
                    return Ok(Synthesis {
                        result,
                        tier: Tier::Primary,
                    });
                }
                Attempt::Malformed
                    if self.settings.malformed_policy == MalformedOutputPolicy::SkipToHeuristic =>
                {
                    info!("Primary provider output unusable, skipping to heuristic analysis");
                    return Ok(Synthesis {
                        result: heuristic,
                        tier: Tier::Heuristic,
                    });
                }
                Attempt::Malformed | Attempt::Unavailable => {}
            }
        }

        if let Some(slot) = &self.secondary {
            if let Attempt::Answered(result) =
                self.attempt(slot, &system, &prompt, &heuristic).await?
            {
                info!("Resume analysis produced by secondary provider {}", slot.name);
                return Ok(Synthesis {
                    result,
                    tier: Tier::Secondary,
                });
            }
        }

        info!("All AI providers failed, using heuristic analysis");
        Ok(Synthesis {
            result: heuristic,
            tier: Tier::Heuristic,
        })
    }

    async fn attempt(
        &self,
        slot: &ProviderSlot,
        system: &str,
        prompt: &str,
        defaults: &ResumeAnalysisResult,
    ) -> Result<Attempt, SynthesisError> {
        let call = slot.client.complete(
            system,
            prompt,
            &slot.model,
            self.settings.max_tokens,
            self.settings.temperature,
        );

        let outcome = match tokio::time::timeout(self.settings.provider_timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(LlmError::Timeout(self.settings.provider_timeout.as_secs())),
        };

        let raw = match outcome {
            Ok(raw) => raw,
            Err(e) if e.is_recoverable() => {
                warn!("Provider {} unavailable: {e}", slot.name);
                return Ok(Attempt::Unavailable);
            }
            Err(e) => {
                error!("Provider {} failed unexpectedly: {e}", slot.name);
                return Err(SynthesisError::ExternalService(format!("{}: {e}", slot.name)));
            }
        };

        match normalize_provider_output(&raw, defaults) {
            Ok(result) => Ok(Attempt::Answered(result)),
            Err(e) => {
                let excerpt: String = raw.chars().take(LOGGED_RAW_CHARS).collect();
                warn!(
                    provider = %slot.name,
                    raw = %excerpt,
                    "Provider returned malformed analysis: {e}"
                );
                Ok(Attempt::Malformed)
            }
        }
    }
}
