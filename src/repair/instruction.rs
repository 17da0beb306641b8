//! Repair Instruction
//!
//! Builds the generator prompt for one repair attempt.

use crate::prompt::{repair_prompt, REPAIR_SYSTEM_PROMPT};
use crate::query::Query;
use crate::services::Prompt;

/// Repairs are asked for deterministically
pub const REPAIR_TEMPERATURE: f64 = 0.0;

pub fn repair_instruction(error: &str, query: &Query) -> Prompt {
    Prompt {
        system: REPAIR_SYSTEM_PROMPT.to_string(),
        user: repair_prompt(error, &query.to_string()),
        temperature: REPAIR_TEMPERATURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_instruction_carries_error_and_query() {
        let query = Query::from(json!({"query": {"terms": {"status": ["paid"]}}}));
        let prompt = repair_instruction("Text fields are not optimised for terms", &query);

        assert_eq!(prompt.system, "You are a JSON fixer.");
        assert_eq!(prompt.temperature, 0.0);
        assert!(prompt.user.contains("Error: Text fields are not optimised for terms"));
        assert!(prompt.user.contains(r#"{"query":{"terms":{"status":["paid"]}}}"#));
    }
}
