// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The structured-Markdown plan grammar (spec.md §4.5): a `**Goal:**` line,
//! a task-group table, and one `### Task <id>` heading per task.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use indexmap::IndexMap;
use tk_core::{KernelError, PlanDefinition, PlanTaskDefinition, Result, DEFAULT_TIMEOUT_SECONDS};

const GOAL_MARKER: &str = "**Goal:**";
const GROUP_TABLE_MARKER: &str = "| Task Group |";
const TASK_HEADING_PREFIX: &str = "### Task ";

/// Detection per spec.md §4.5: both the goal marker and the group-table
/// header must be present, otherwise this isn't a Markdown plan.
pub fn looks_like_markdown(document: &str) -> bool {
    document.contains(GOAL_MARKER) && document.contains(GROUP_TABLE_MARKER)
}

struct Section {
    id: String,
    description: String,
    body: String,
}

pub fn parse(document: &str) -> Result<PlanDefinition> {
    let goal = extract_goal(document);
    let groups = extract_groups(document);
    let sections = extract_task_sections(document);

    let heading_ids: BTreeSet<&str> = sections.iter().map(|s| s.id.as_str()).collect();
    let group_ids: BTreeSet<&str> =
        groups.values().flat_map(|ids| ids.iter().map(|s| s.as_str())).collect();

    let mut orphans: Vec<String> =
        heading_ids.difference(&group_ids).map(|s| s.to_string()).collect();
    if !orphans.is_empty() {
        orphans.sort();
        return Err(KernelError::OrphanTasks(orphans));
    }

    let mut phantoms: Vec<String> =
        group_ids.difference(&heading_ids).map(|s| s.to_string()).collect();
    if !phantoms.is_empty() {
        phantoms.sort();
        return Err(KernelError::PhantomTasks(phantoms));
    }

    let section_by_id: HashMap<&str, &Section> =
        sections.iter().map(|s| (s.id.as_str(), s)).collect();

    // Insertion order follows group order (ascending), then table-listed
    // order within a group — this is the order `claim_task`'s insertion-
    // order scan will see, which matches the document's declared structure
    // more reliably than raw heading-appearance order.
    let mut tasks = IndexMap::new();
    let group_numbers: Vec<i64> = groups.keys().copied().collect();
    for n in group_numbers {
        let ids = groups.get(&n).cloned().unwrap_or_default();
        let dependencies: Vec<String> =
            if n >= 2 { groups.get(&(n - 1)).cloned().unwrap_or_default() } else { Vec::new() };
        for id in ids {
            let section = section_by_id.get(id.as_str());
            let description =
                section.map(|s| s.description.clone()).unwrap_or_else(|| format!("Task {id}"));
            let body = section.map(|s| s.body.clone()).unwrap_or_default();
            let role = extract_role(&body);
            let instructions = if body.is_empty() { None } else { Some(body) };
            tasks.insert(
                id,
                PlanTaskDefinition {
                    description,
                    dependencies: dependencies.clone(),
                    timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
                    instructions,
                    role,
                },
            );
        }
    }

    Ok(PlanDefinition { goal, tasks })
}

fn extract_goal(document: &str) -> String {
    for line in document.lines() {
        if let Some(idx) = line.find(GOAL_MARKER) {
            let rest = line[idx + GOAL_MARKER.len()..].trim();
            if !rest.is_empty() {
                return rest.to_string();
            }
            break;
        }
    }
    "Goal not specified".to_string()
}

/// `| Group <N> | id1, id2, ... | anything |` rows, in document order.
fn extract_groups(document: &str) -> BTreeMap<i64, Vec<String>> {
    let mut groups: BTreeMap<i64, Vec<String>> = BTreeMap::new();
    for line in document.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with('|') {
            continue;
        }
        let cells: Vec<&str> = trimmed.split('|').map(str::trim).filter(|c| !c.is_empty()).collect();
        if cells.len() < 2 {
            continue;
        }
        let Some(num_str) = cells[0].strip_prefix("Group ") else {
            continue;
        };
        let Ok(n) = num_str.trim().parse::<i64>() else {
            continue;
        };
        let ids: Vec<String> = cells[1]
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| id.to_string())
            .collect();
        groups.entry(n).or_default().extend(ids);
    }
    groups
}

/// `### Task <id>[: <description>]` headings, tolerating optional space
/// before the colon and an omitted description. A heading missing the
/// space between the literal `Task` and the id (e.g. `### Task2`) simply
/// doesn't match this prefix and is treated as ordinary body text — this
/// is what makes such a typo surface as a phantom task rather than being
/// silently accepted.
fn extract_task_sections(document: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut body = String::new();

    for line in document.lines() {
        if let Some(rest) = line.trim_start().strip_prefix(TASK_HEADING_PREFIX) {
            if let Some(last) = sections.last_mut() {
                last.body = body.trim().to_string();
            }
            body.clear();

            let rest = rest.trim_end();
            let (id_part, desc_part) = match rest.find(':') {
                Some(idx) => (rest[..idx].trim(), rest[idx + 1..].trim()),
                None => (rest.trim(), ""),
            };
            let id = id_part.to_string();
            let description =
                if desc_part.is_empty() { format!("Task {id}") } else { desc_part.to_string() };
            sections.push(Section { id, description, body: String::new() });
        } else if !sections.is_empty() {
            body.push_str(line);
            body.push('\n');
        }
    }
    if let Some(last) = sections.last_mut() {
        last.body = body.trim().to_string();
    }
    sections
}

/// Supplementary convention: a `role: <name>` line anywhere in a task's
/// body sets `role` without needing a dedicated table column.
fn extract_role(body: &str) -> Option<String> {
    body.lines()
        .find_map(|line| line.trim().strip_prefix("role:").map(|rest| rest.trim().to_string()))
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "markdown_tests.rs"]
mod tests;
