//! Text rendering for agents, memory, and prompts.

use std::io::BufRead;

use letta_npc::util::title_case;
use letta_npc::{Agent, BlockLabel, DeleteReport, Memory};

pub(crate) const RULE_WIDTH: usize = 80;

pub(crate) fn heavy_rule() -> String {
    "=".repeat(RULE_WIDTH)
}

pub(crate) fn light_rule() -> String {
    "-".repeat(RULE_WIDTH)
}

/// ID, name, and creation time of one agent.
pub(crate) fn agent_lines(agent: &Agent) -> Vec<String> {
    vec![
        format!("ID: {}", agent.id),
        format!("Name: {}", agent.name),
        format!(
            "Created: {}",
            agent.created_at.as_deref().unwrap_or("unknown")
        ),
    ]
}

/// `Human: ...` / `Persona: ...` lines, headed by a blank line.
pub(crate) fn memory_lines(memory: &Memory) -> Vec<String> {
    let mut lines = vec![String::new(), "Memory:".to_string()];
    for label in BlockLabel::ALL {
        let block = memory.block(label);
        let name = if block.label.is_empty() {
            label.as_str()
        } else {
            block.label.as_str()
        };
        lines.push(format!("{}: {}", title_case(name), block.value));
    }
    lines
}

pub(crate) fn report_lines(report: &DeleteReport) -> Vec<String> {
    let mut lines = Vec::new();
    for id in &report.deleted {
        lines.push(format!("✓ Deleted agent: {id}"));
    }
    for id in &report.skipped {
        lines.push(format!("- Already gone: {id}"));
    }
    for (id, err) in &report.failed {
        lines.push(format!("✗ Error deleting agent {id}: {err}"));
    }
    lines.push(String::new());
    lines.push(format!(
        "Deleted {}, skipped {}, failed {}.",
        report.deleted.len(),
        report.skipped.len(),
        report.failed.len()
    ));
    lines
}

/// Read one line from `input` and accept only `y`/`yes`.
pub(crate) fn read_confirmation(input: &mut impl BufRead) -> std::io::Result<bool> {
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
