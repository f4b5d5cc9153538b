//! Rich-content payloads for the rendering layer
//!
//! A closed union of visualization kinds. The engine treats these as opaque;
//! only the view layer interprets them. Consumers switch on the `type` tag
//! and must render a placeholder for unrecognized future tags, which is what
//! the `Unknown` fallback variant deserializes to.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single named data point (label/value pair) used by chart payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: String,
    pub value: f64,
}

/// A key performance indicator tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
}

/// One milestone on a roadmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<String>,
}

/// Structured visualization payload attached to a model message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RichContent {
    Table {
        title: String,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    BarChart {
        title: String,
        data: Vec<DataPoint>,
    },
    LineChart {
        title: String,
        data: Vec<DataPoint>,
    },
    FinancialSummary {
        title: String,
        total_balance: f64,
        income: f64,
        expenses: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        savings_rate: Option<f64>,
    },
    ActionableSuggestion {
        title: String,
        description: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        action_label: Option<String>,
    },
    KpiDashboard {
        title: String,
        kpis: Vec<Kpi>,
    },
    Roadmap {
        title: String,
        milestones: Vec<Milestone>,
    },
    /// Fallback for tags introduced after this build; rendered as a placeholder
    #[serde(other)]
    Unknown,
}

impl RichContent {
    /// Whether this payload is renderable (not the unknown-tag fallback)
    pub fn is_known(&self) -> bool {
        !matches!(self, RichContent::Unknown)
    }

    /// Try to decode a rich-content payload from a raw JSON value
    pub fn from_value(value: Value) -> Option<RichContent> {
        serde_json::from_value(value).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tagged_roundtrip() {
        let payload = RichContent::BarChart {
            title: "Spending".to_string(),
            data: vec![DataPoint {
                label: "Food".to_string(),
                value: 420.5,
            }],
        };
        let v = serde_json::to_value(&payload).unwrap();
        assert_eq!(v["type"], "bar-chart");
        let back: RichContent = serde_json::from_value(v).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_unknown_tag_falls_back() {
        let v = json!({"type": "hologram", "frames": 12});
        let parsed: RichContent = serde_json::from_value(v).unwrap();
        assert_eq!(parsed, RichContent::Unknown);
        assert!(!parsed.is_known());
    }

    #[test]
    fn test_from_value_rejects_non_payloads() {
        assert!(RichContent::from_value(json!("just text")).is_none());
        assert!(RichContent::from_value(json!({"no_type": true})).is_none());
    }
}
