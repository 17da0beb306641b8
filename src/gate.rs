//! Execution Gate
//!
//! Decides whether a query may run against live data. High risk is refused
//! with the scorer's reasons; everything else passes.

use crate::query::Query;
use crate::risk::{RiskLevel, RiskScorer};
use tracing::{debug, warn};

/// Authorization decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Vec<String>),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Pre-execution gate over the risk scorer
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionGate {
    scorer: RiskScorer,
}

impl ExecutionGate {
    pub fn new(scorer: RiskScorer) -> Self {
        Self { scorer }
    }

    pub fn authorize(&self, query: &Query) -> Decision {
        let risk = self.scorer.evaluate(query);
        // medium is informational only
        if risk.level == RiskLevel::High {
            warn!("Blocking high risk query (score {}): {:?}", risk.score, risk.reasons);
            return Decision::Deny(risk.reasons);
        }
        debug!("Query allowed with {} risk (score {})", risk.level, risk.score);
        Decision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_high_risk_denied_with_reasons() {
        let gate = ExecutionGate::default();
        let query = Query::from(json!({"query": {"wildcard": {"field": "*val*"}, "script": "1"}}));
        assert_eq!(
            gate.authorize(&query),
            Decision::Deny(vec!["Wildcard query used".to_string(), "Scripting used".to_string()])
        );
    }

    #[test]
    fn test_medium_risk_allowed() {
        let gate = ExecutionGate::default();
        let query = Query::from(json!({"query": {"wildcard": {"field": "*val*"}}}));
        assert!(gate.authorize(&query).is_allowed());
    }

    #[test]
    fn test_low_risk_allowed() {
        let gate = ExecutionGate::default();
        let query = Query::from(json!({"query": {"match_all": {}}, "size": 10}));
        assert_eq!(gate.authorize(&query), Decision::Allow);
    }
}
