// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat completions.
//!
//! Provides [`OpenAiClient`], which handles authentication, JSON-mode
//! requests, and bounded retry of transient failures (429, 5xx, timeouts,
//! and replies that are not the JSON object we asked for).

use std::time::Duration;

use leadhound_core::{LeadhoundError, RetryDecision, RetryError, RetryPolicy, retry_with_backoff};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

const BACKOFF_BASE: Duration = Duration::from_millis(500);
const BACKOFF_MAX: Duration = Duration::from_secs(8);

/// One failed attempt, tagged with whether repeating it may help.
#[derive(Debug, Error)]
#[error("{message}")]
struct CallError {
    message: String,
    transient: bool,
}

impl CallError {
    fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: true,
        }
    }

    fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    endpoint: String,
    backoff_base: Duration,
}

impl OpenAiClient {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, LeadhoundError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| LeadhoundError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| LeadhoundError::Classifier {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            backoff_base: BACKOFF_BASE,
        })
    }

    /// Overrides the first retry delay (tests use zero).
    #[cfg(test)]
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends `request` and parses the first choice's content as `T`.
    ///
    /// Makes at most `max_attempts` calls; transient failures back off
    /// exponentially between attempts.
    pub async fn complete_json<T: DeserializeOwned>(
        &self,
        request: &ChatRequest,
        max_attempts: u32,
    ) -> Result<T, LeadhoundError> {
        let policy = RetryPolicy::new(max_attempts, self.backoff_base, BACKOFF_MAX);
        retry_with_backoff(
            policy,
            || self.attempt::<T>(request),
            |e: &CallError| {
                if e.transient {
                    RetryDecision::Backoff
                } else {
                    RetryDecision::Abort
                }
            },
        )
        .await
        .map_err(|e| {
            let message = match e {
                RetryError::Exhausted { attempts, last } => {
                    format!("gave up after {attempts} attempts: {last}")
                }
                RetryError::Aborted(err) => err.message,
            };
            LeadhoundError::classifier(message)
        })
    }

    async fn attempt<T: DeserializeOwned>(&self, request: &ChatRequest) -> Result<T, CallError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let message = format!("HTTP request failed: {e}");
                if e.is_timeout() || e.is_connect() {
                    CallError::transient(message)
                } else {
                    CallError::fatal(message)
                }
            })?;

        let status = response.status();
        debug!(status = %status, model = %request.model, "completion response received");
        let body = response
            .text()
            .await
            .map_err(|e| CallError::transient(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api) => format!(
                    "API error {status} ({}): {}",
                    api.error.type_.as_deref().unwrap_or("unknown"),
                    api.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(if is_transient_status(status) {
                CallError::transient(message)
            } else {
                CallError::fatal(message)
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| CallError::fatal(format!("failed to parse API response: {e}")))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| CallError::transient("response contained no message content"))?;

        // A resample may follow the schema.
        serde_json::from_str(&content)
            .map_err(|e| CallError::transient(format!("model reply is not valid verdict JSON: {e}")))
    }
}

/// Returns true for HTTP status codes worth retrying.
fn is_transient_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
