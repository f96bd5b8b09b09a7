// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible stage classifier for Leadhound.
//!
//! Implements [`StageClassifier`] against any chat completions endpoint
//! that supports JSON mode. Stage one is a cheap POTENTIAL/JUNK triage;
//! stage two returns a lead assessment mapped onto the four-level status
//! scale.

pub mod client;
pub mod types;

use async_trait::async_trait;
use leadhound_config::model::{OpenAiConfig, StageConfig};
use leadhound_core::{
    AdapterType, HealthStatus, LeadhoundError, Message, PluginAdapter, StageClassifier,
    ValidationResult, ValidationStatus,
};
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::types::{
    ChatMessage, ChatRequest, ResponseFormat, StageOneReply, StageTwoReply, Verdict,
    normalize_lead_type,
};

/// Confidence recorded for a POTENTIAL verdict that omits one.
const DEFAULT_TRIAGE_CONFIDENCE: f64 = 0.5;

/// Two-stage classifier backed by chat completions.
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var -> error.
pub struct OpenAiClassifier {
    client: OpenAiClient,
    stage_one: StageConfig,
    stage_two: StageConfig,
}

impl OpenAiClassifier {
    pub fn new(config: &OpenAiConfig) -> Result<Self, LeadhoundError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = OpenAiClient::new(&api_key, &config.base_url, config.timeout())?;
        info!(
            stage_one = %config.stage_one.model,
            stage_two = %config.stage_two.model,
            "OpenAI classifier initialized"
        );
        Ok(Self::with_client(client, config))
    }

    fn with_client(client: OpenAiClient, config: &OpenAiConfig) -> Self {
        Self {
            client,
            stage_one: config.stage_one.clone(),
            stage_two: config.stage_two.clone(),
        }
    }

    async fn ask<T: serde::de::DeserializeOwned>(
        &self,
        stage: &StageConfig,
        message: &Message,
    ) -> Result<T, LeadhoundError> {
        let request = ChatRequest {
            model: stage.model.clone(),
            messages: vec![
                ChatMessage::system(stage.system_prompt.clone()),
                ChatMessage::user(user_prompt(message)),
            ],
            temperature: stage.temperature,
            response_format: ResponseFormat::json_object(),
        };
        self.client.complete_json(&request, stage.max_retries).await
    }
}

fn user_prompt(message: &Message) -> String {
    format!("Analyze this message:\n---\n{}\n---", message.content)
}

fn resolve_api_key(config_key: &Option<String>) -> Result<String, LeadhoundError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            LeadhoundError::Config(
                "OpenAI API key not found. Set openai.api_key in config \
                 or the OPENAI_API_KEY environment variable."
                    .into(),
            )
        })
}

/// Maps a triage reply onto the status scale.
fn triage_result(reply: StageOneReply) -> ValidationResult {
    let reason = reply.reason.unwrap_or_default();
    match reply.verdict {
        Verdict::Potential => ValidationResult::new(
            ValidationStatus::PossiblyRelevant,
            reply.confidence.unwrap_or(DEFAULT_TRIAGE_CONFIDENCE),
            reason,
        ),
        Verdict::Junk => ValidationResult::new(
            ValidationStatus::Unrelevant,
            reply.confidence.unwrap_or(0.0),
            reason,
        ),
    }
}

/// Maps a detailed assessment onto the status scale.
fn assessment_result(reply: StageTwoReply) -> ValidationResult {
    let status = ValidationStatus::from_lead_score(reply.is_lead, reply.confidence);
    ValidationResult::new(status, reply.confidence, reply.summary.unwrap_or_default())
        .with_lead_type(normalize_lead_type(reply.lead_type.as_deref()))
        .with_tags(reply.tech_stack.filter(|t| !t.is_empty()))
}

#[async_trait]
impl PluginAdapter for OpenAiClassifier {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Classifier
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadhoundError> {
        // No probe call: it would spend tokens.
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl StageClassifier for OpenAiClassifier {
    async fn stage_one(&self, message: &Message) -> Result<ValidationResult, LeadhoundError> {
        let reply: StageOneReply = self.ask(&self.stage_one, message).await?;
        let result = triage_result(reply);
        debug!(msg_id = message.id, stage = 1, status = %result.status, score = result.score, "triage complete");
        Ok(result)
    }

    async fn stage_two(&self, message: &Message) -> Result<ValidationResult, LeadhoundError> {
        let reply: StageTwoReply = self.ask(&self.stage_two, message).await?;
        let result = assessment_result(reply);
        debug!(msg_id = message.id, stage = 2, status = %result.status, score = result.score, "assessment complete");
        Ok(result)
    }
}
