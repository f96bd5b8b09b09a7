// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-readable row formatting shared by the CSV sink and the export command.

use std::collections::BTreeMap;

use leadhound_config::model::{ExportConfig, StatusLabels};
use leadhound_core::Opportunity;

/// Column titles, in row order.
pub const HEADER: [&str; 10] = [
    "Time",
    "Server Name",
    "Channel Name",
    "Sender Name",
    "Message Content",
    "Status",
    "Score",
    "Type",
    "Manual Status",
    "Message Link",
];

/// Turns opportunities into display rows.
#[derive(Debug, Clone, Default)]
pub struct RowFormatter {
    status_labels: StatusLabels,
    lead_type_labels: BTreeMap<String, String>,
}

impl RowFormatter {
    pub fn new(status_labels: StatusLabels, lead_type_labels: BTreeMap<String, String>) -> Self {
        Self {
            status_labels,
            lead_type_labels,
        }
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(config.status_labels.clone(), config.lead_type_labels.clone())
    }

    /// Formats one opportunity. Status, score and type come from the final
    /// classification stage.
    pub fn row(&self, opportunity: &Opportunity, manual_status: Option<&str>) -> Vec<String> {
        let message = opportunity.message();
        let result = opportunity.final_result();
        vec![
            message.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            message.guild_name.clone().unwrap_or_default(),
            message.channel_name.clone(),
            message.author_name.clone(),
            message.content.clone(),
            self.status_labels.label(result.status).to_string(),
            format!("{:.0}%", result.score * 100.0),
            self.lead_type(result.lead_type.as_deref()),
            manual_status.unwrap_or_default().to_string(),
            message.permalink.clone(),
        ]
    }

    fn lead_type(&self, tag: Option<&str>) -> String {
        match tag {
            Some(tag) => self
                .lead_type_labels
                .get(tag)
                .cloned()
                .unwrap_or_else(|| tag.to_string()),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use leadhound_core::{ValidationResult, ValidationStatus};
    use leadhound_test_utils::fixtures;

    use super::*;

    fn formatter() -> RowFormatter {
        RowFormatter::from_config(&ExportConfig::default())
    }

    #[test]
    fn header_matches_row_width() {
        let row = formatter().row(
            &fixtures::opportunity(1, 10, ValidationStatus::Relevant),
            None,
        );
        assert_eq!(row.len(), HEADER.len());
    }

    #[test]
    fn formats_final_stage_for_display() {
        let mut message = fixtures::message(1, 10, "need a rust contractor");
        message.timestamp = chrono::Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        let mut stage_two = ValidationResult::new(ValidationStatus::Relevant, 0.856, "clear ask");
        stage_two.lead_type = Some("project_work".into());
        let opportunity = Opportunity::from_parts(
            message,
            ValidationResult::new(ValidationStatus::PossiblyRelevant, 0.5, "maybe"),
            Some(stage_two),
            fixtures::discovery(leadhound_core::SourceMode::Live),
        )
        .unwrap();

        let row = formatter().row(&opportunity, Some("approved"));
        assert_eq!(row[0], "2026-03-04 05:06:07");
        assert_eq!(row[1], "Test Guild");
        assert_eq!(row[2], "general");
        assert_eq!(row[4], "need a rust contractor");
        assert_eq!(row[5], "🔥 Hot Lead");
        assert_eq!(row[6], "86%");
        assert_eq!(row[7], "Project Work");
        assert_eq!(row[8], "approved");
        assert_eq!(row[9], fixtures::permalink(1, 10));
    }

    #[test]
    fn unknown_lead_type_is_shown_verbatim() {
        assert_eq!(formatter().lead_type(Some("bounty")), "bounty");
        assert_eq!(formatter().lead_type(None), "");
    }

    #[test]
    fn stage_one_error_row_has_error_label() {
        let row = formatter().row(&fixtures::opportunity(1, 11, ValidationStatus::Error), None);
        assert_eq!(row[5], "⚠️ Error");
        assert_eq!(row[6], "0%");
        assert_eq!(row[8], "");
    }
}
