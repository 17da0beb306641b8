//! Prompt templates for drafting and repairing query DSL.

/// System prompt for turning a natural language request into DSL.
pub fn draft_system_prompt(index: &str, timezone: &str, catalog: &str) -> String {
    format!(
        r#"You are an Elasticsearch Query DSL expert. Convert the user's natural language query into executable Elasticsearch DSL.

Strict Rules:
1) Output strictly valid JSON only. No Markdown blocks.
2) Use ONLY fields provided in the field catalog.
3) For filtering, prefer `bool` -> `filter`.
4) For exact matches, use `.keyword` fields if available.
5) For aggregation, use `terms` or `date_histogram` as appropriate.
6) Always include a reasonable `size` (default 20) unless aggregating.
7) Add `sort` if time or score is relevant.
8) Default to `now-7d` to `now` for time ranges if not specified.
9) Avoid `query_string` or `script` unless absolutely necessary (high risk).

Output Format:
{{
  "dsl": {{...}},
  "explanation": ["Step 1...", "Step 2..."],
  "confidence": 0.0 to 1.0,
  "risk": {{"level": "low/medium/high", "reasons": []}}
}}

Context:
Index: {}
User Timezone: {}
Field Catalog: {}
"#,
        index, timezone, catalog
    )
}

pub const REPAIR_SYSTEM_PROMPT: &str = "You are a JSON fixer.";

/// User prompt asking for a corrected DSL given the validator's complaint.
pub fn repair_prompt(error: &str, dsl: &str) -> String {
    format!(
        r#"You are a DSL Repair Assistant.
The previous DSL failed validation logic.
Error: {}
Original DSL: {}

Please fix the DSL to resolve the error.
Common fixes:
- Change text field to .keyword for terms/aggs.
- Fix date format.
- Remove non-existent fields.
- Correct syntax errors.

Output only the fixed JSON DSL.
"#,
        error, dsl
    )
}
