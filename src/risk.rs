//! Risk Scorer
//!
//! Scores a query body against fixed cost and expressiveness red flags
//! before it is allowed anywhere near live data.

use crate::query::{Query, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

const DEFAULT_SIZE: f64 = 10.0;
const DEFAULT_FROM: f64 = 0.0;

const LARGE_SIZE_LIMIT: f64 = 200.0;
const LARGE_SIZE_WEIGHT: u32 = 20;

const DEEP_PAGINATION_LIMIT: f64 = 10_000.0;
const DEEP_PAGINATION_WEIGHT: u32 = 30;

const MARKER_WEIGHT: u32 = 40;

const HIGH_THRESHOLD: u32 = 60;
const MEDIUM_THRESHOLD: u32 = 30;

/// Risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        if score >= HIGH_THRESHOLD {
            RiskLevel::High
        } else if score >= MEDIUM_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Risk assessment result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub score: u32,
    pub reasons: Vec<String>,
}

/// Structural keys whose presence anywhere in a query raises risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Wildcard,
    Regexp,
    Script,
}

impl Marker {
    /// Discovery order used for `reasons`.
    pub const ALL: [Marker; 3] = [Marker::Wildcard, Marker::Regexp, Marker::Script];

    pub fn key(&self) -> &'static str {
        match self {
            Marker::Wildcard => "wildcard",
            Marker::Regexp => "regexp",
            Marker::Script => "script",
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Marker::Wildcard => "Wildcard query used",
            Marker::Regexp => "Regexp query used",
            Marker::Script => "Scripting used",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Marker::ALL.into_iter().find(|m| m.key() == key)
    }

    fn index(&self) -> usize {
        match self {
            Marker::Wildcard => 0,
            Marker::Regexp => 1,
            Marker::Script => 2,
        }
    }
}

/// Single pass over the tree recording which markers appear at all.
#[derive(Default)]
struct MarkerScan {
    found: [bool; 3],
}

impl MarkerScan {
    fn contains(&self, marker: Marker) -> bool {
        self.found[marker.index()]
    }
}

impl Visitor for MarkerScan {
    fn visit_key(&mut self, key: &str) {
        if let Some(marker) = Marker::from_key(key) {
            self.found[marker.index()] = true;
        }
    }

    fn finished(&self) -> bool {
        self.found.iter().all(|f| *f)
    }
}

/// Deterministic risk scorer. Weights and thresholds are fixed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskScorer;

impl RiskScorer {
    pub fn new() -> Self {
        Self
    }

    /// Assess a query. Total: unknown shapes simply carry no risk signals.
    pub fn evaluate(&self, query: &Query) -> RiskAssessment {
        let mut score = 0;
        let mut reasons = Vec::new();

        // size / from are read positionally off the top-level body only
        let size = query.get("size").and_then(Query::as_f64).unwrap_or(DEFAULT_SIZE);
        let from = query.get("from").and_then(Query::as_f64).unwrap_or(DEFAULT_FROM);

        if size > LARGE_SIZE_LIMIT {
            score += LARGE_SIZE_WEIGHT;
            reasons.push("Size > 200".to_string());
        }
        if size + from > DEEP_PAGINATION_LIMIT {
            score += DEEP_PAGINATION_WEIGHT;
            reasons.push("Deep pagination (from+size > 10000)".to_string());
        }

        let mut scan = MarkerScan::default();
        query.accept(&mut scan);
        for marker in Marker::ALL {
            if scan.contains(marker) {
                score += MARKER_WEIGHT;
                reasons.push(marker.reason().to_string());
            }
        }

        RiskAssessment {
            level: RiskLevel::from_score(score),
            score,
            reasons,
        }
    }
}
