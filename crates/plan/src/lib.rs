// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tk-plan: parses a plan document (structured Markdown, or a JSON fallback)
//! into a validated [`tk_core::PlanDefinition`] (spec.md §4.5).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod json_fallback;
mod markdown;

use tk_core::{KernelError, PlanDefinition, Result};

/// Parse a plan document and validate the resulting DAG (dependency
/// existence + acyclicity, via `WorkflowState::validate`). Markdown is
/// tried first; a fenced JSON object is the fallback.
pub fn parse_plan(document: &str) -> Result<PlanDefinition> {
    let plan = if markdown::looks_like_markdown(document) {
        markdown::parse(document)?
    } else if let Some(json) = json_fallback::extract_fenced_json(document) {
        json_fallback::parse(&json)?
    } else {
        return Err(KernelError::UnrecognizedFormat);
    };

    plan.clone().into_workflow_state().validate()?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_document_is_rejected() {
        let err = parse_plan("nothing resembling a plan here").unwrap_err();
        assert!(matches!(err, KernelError::UnrecognizedFormat));
    }

    #[test]
    fn markdown_is_preferred_even_when_json_is_also_present() {
        let doc = "\
**Goal:** from markdown

| Task Group | Ids | Notes |
|---|---|---|
| Group 1 | 1 | setup |

### Task 1
a

```json
{\"goal\": \"from json\", \"tasks\": {}}
```
";
        let plan = parse_plan(doc).unwrap();
        assert_eq!(plan.goal, "from markdown");
    }

    #[test]
    fn json_fallback_is_used_when_no_markdown_markers_present() {
        let doc = "\
```json
{\"goal\": \"g\", \"tasks\": {\"1\": {\"description\": \"d\"}, \"2\": {\"description\": \"e\", \"dependencies\": [\"1\"]}}}
```
";
        let plan = parse_plan(doc).unwrap();
        assert_eq!(plan.tasks.len(), 2);
    }

    // Scenario 9: plan-cycle rejection.
    #[test]
    fn cyclic_plan_is_rejected_with_cycle_in_the_message() {
        let doc = "\
```json
{\"goal\": \"g\", \"tasks\": {\"a\": {\"description\": \"a\", \"dependencies\": [\"b\"]}, \"b\": {\"description\": \"b\", \"dependencies\": [\"a\"]}}}
```
";
        let err = parse_plan(doc).unwrap_err();
        assert!(matches!(err, KernelError::Cycle(_)));
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn missing_dependency_is_rejected() {
        let doc = "\
```json
{\"goal\": \"g\", \"tasks\": {\"a\": {\"description\": \"a\", \"dependencies\": [\"ghost\"]}}}
```
";
        let err = parse_plan(doc).unwrap_err();
        assert!(matches!(err, KernelError::MissingDependency { .. }));
    }
}
