//! Finalized Query Plan
//!
//! The planner's output for one user query: which entities it touches, how
//! they join, and which fields it asks for.

use crate::error::{GuardError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a field, either bare (`region`) or qualified (`customers.region`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldRef(String);

/// Parsed shape of a field reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPath<'a> {
    Bare(&'a str),
    Qualified { entity: &'a str, field: &'a str },
}

impl FieldRef {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split at the first `.`
    pub fn parse(&self) -> FieldPath<'_> {
        match self.0.split_once('.') {
            Some((entity, field)) => FieldPath::Qualified { entity, field },
            None => FieldPath::Bare(&self.0),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FieldRef {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Declared relationship between two entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinEdge {
    pub from: String,
    pub to: String,
}

impl JoinEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Requested time window; only its presence matters to validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub grain: Option<String>,
}

/// Fields the user asked for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanIntent {
    #[serde(default)]
    pub dimensions: Vec<FieldRef>,
    #[serde(default, alias = "measures")]
    pub metrics: Vec<FieldRef>,
    #[serde(default)]
    pub time_range: Option<TimeRange>,
}

/// Planner output consumed once per query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedPlan {
    #[serde(default)]
    pub selected_entities: Vec<String>,
    #[serde(default)]
    pub join_graph: Vec<JoinEdge>,
    #[serde(default)]
    pub intent: PlanIntent,
}

impl FinalizedPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| GuardError::Plan(format!("Failed to parse finalized plan JSON: {}", e)))
    }

    pub fn with_entities<I, S>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_entities = entities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_join(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.join_graph.push(JoinEdge::new(from, to));
        self
    }

    pub fn with_dimensions<I, S>(mut self, dimensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.intent.dimensions = dimensions.into_iter().map(|d| FieldRef::new(d)).collect();
        self
    }

    pub fn with_metrics<I, S>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.intent.metrics = metrics.into_iter().map(|m| FieldRef::new(m)).collect();
        self
    }

    pub fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.intent.time_range = Some(time_range);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_ref_parse() {
        assert_eq!(FieldRef::from("region").parse(), FieldPath::Bare("region"));
        assert_eq!(
            FieldRef::from("customers.region").parse(),
            FieldPath::Qualified {
                entity: "customers",
                field: "region"
            }
        );
        assert_eq!(
            FieldRef::from("a.b.c").parse(),
            FieldPath::Qualified {
                entity: "a",
                field: "b.c"
            }
        );
    }

    #[test]
    fn test_plan_from_planner_json() {
        let plan = FinalizedPlan::from_json(
            r#"{
                "selectedEntities": ["orders", "customers"],
                "joinGraph": [{"from": "orders", "to": "customers"}],
                "intent": {
                    "dimensions": ["customers.region"],
                    "measures": ["revenue"],
                    "timeRange": {"start": "2024-01-01", "end": "2024-03-31"}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(plan.selected_entities, vec!["orders", "customers"]);
        assert_eq!(plan.join_graph, vec![JoinEdge::new("orders", "customers")]);
        assert_eq!(plan.intent.metrics, vec![FieldRef::from("revenue")]);
        assert_eq!(
            plan.intent.time_range.as_ref().and_then(|t| t.start.as_deref()),
            Some("2024-01-01")
        );
    }

    #[test]
    fn test_plan_defaults_missing_sections() {
        let plan = FinalizedPlan::from_json("{}").unwrap();
        assert_eq!(plan, FinalizedPlan::new());
        assert!(plan.intent.time_range.is_none());
    }

    #[test]
    fn test_plan_rejects_bad_json() {
        let err = FinalizedPlan::from_json("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("Failed to parse finalized plan JSON"));
    }
}
