// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the chat completions API and the stage verdict payloads.

use serde::{Deserialize, Serialize};

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Asks the model for a JSON object reply.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub type_: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            type_: "json_object".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Error envelope returned with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Potential,
    Junk,
}

/// Stage one reply.
#[derive(Debug, Clone, Deserialize)]
pub struct StageOneReply {
    pub verdict: Verdict,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Stage two reply.
#[derive(Debug, Clone, Deserialize)]
pub struct StageTwoReply {
    pub is_lead: bool,
    pub confidence: f64,
    #[serde(default)]
    pub lead_type: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tech_stack: Option<Vec<String>>,
}

/// Lead types the stage two prompt offers.
pub const LEAD_TYPES: [&str; 4] = ["direct_hire", "project_work", "paid_help", "other"];

/// Normalizes a model-supplied lead type: blank means none, anything
/// outside [`LEAD_TYPES`] becomes `other`.
pub fn normalize_lead_type(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim().to_lowercase();
    if raw.is_empty() {
        None
    } else if LEAD_TYPES.contains(&raw.as_str()) {
        Some(raw)
    } else {
        Some("other".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_json_mode() {
        let request = ChatRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![ChatMessage::system("be brief"), ChatMessage::user("hi")],
            temperature: 0.0,
            response_format: ResponseFormat::json_object(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][1]["role"], "user");
    }

    #[test]
    fn stage_one_reply_tolerates_missing_fields() {
        let reply: StageOneReply = serde_json::from_str(r#"{"verdict":"JUNK"}"#).unwrap();
        assert_eq!(reply.verdict, Verdict::Junk);
        assert!(reply.confidence.is_none());
        assert!(serde_json::from_str::<StageOneReply>(r#"{"verdict":"MAYBE"}"#).is_err());
    }

    #[test]
    fn stage_two_reply_parses_full_payload() {
        let reply: StageTwoReply = serde_json::from_str(
            r#"{"is_lead":true,"confidence":0.92,"lead_type":"project_work",
                "summary":"Needs a Rust backend","tech_stack":["rust","axum"]}"#,
        )
        .unwrap();
        assert!(reply.is_lead);
        assert_eq!(reply.tech_stack.unwrap().len(), 2);
    }

    #[test]
    fn lead_types_are_normalized() {
        assert_eq!(normalize_lead_type(Some("Paid_Help")).as_deref(), Some("paid_help"));
        assert_eq!(normalize_lead_type(Some("cofounder")).as_deref(), Some("other"));
        assert_eq!(normalize_lead_type(Some("  ")), None);
        assert_eq!(normalize_lead_type(None), None);
    }
}
