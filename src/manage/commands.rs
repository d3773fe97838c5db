//! `list`, `get`, `delete`, and `delete-all` handlers.

use std::io::{self, Write};

use anyhow::{Context, Result};
use letta_npc::{Agent, LettaError};

use super::AgentManager;
use super::render::{
    agent_lines, heavy_rule, light_rule, memory_lines, read_confirmation, report_lines,
};

// ── list / get ───────────────────────────────────────────────────────

impl AgentManager {
    pub fn list_agents(&self, verbose: bool) -> bool {
        let agents = match self.client.list_agents() {
            Ok(agents) => agents,
            Err(err) => {
                println!("Error listing agents: {err}");
                return false;
            }
        };

        println!("\nLetta Agents:");
        println!("{}", heavy_rule());
        if agents.is_empty() {
            println!("No agents found.");
        }
        for agent in &agents {
            self.print_agent(agent, verbose);
            println!("{}", light_rule());
        }
        true
    }

    pub fn get_agent(&self, agent_id: &str) -> bool {
        match self.client.get_agent(agent_id) {
            Ok(agent) => {
                println!("\nAgent Details:");
                println!("{}", heavy_rule());
                self.print_agent(&agent, true);
                true
            }
            Err(err) => {
                println!("Error getting agent {agent_id}: {err}");
                false
            }
        }
    }

    fn print_agent(&self, agent: &Agent, with_memory: bool) {
        for line in agent_lines(agent) {
            println!("{line}");
        }
        if !with_memory {
            return;
        }
        match self.client.get_memory(&agent.id) {
            Ok(memory) => {
                for line in memory_lines(&memory) {
                    println!("{line}");
                }
            }
            Err(err) => tracing::warn!(agent_id = %agent.id, error = %err, "memory unavailable"),
        }
    }
}

// ── delete ───────────────────────────────────────────────────────────

impl AgentManager {
    pub fn delete_agent(&self, agent_id: &str) -> bool {
        match self.client.delete_agent(agent_id) {
            Ok(()) => {
                println!("✓ Deleted agent: {agent_id}");
                true
            }
            Err(err) => {
                println!("✗ Error deleting agent {agent_id}: {err}");
                false
            }
        }
    }

    /// Delete every agent, asking first unless `assume_yes`.
    pub fn delete_all_agents(&self, assume_yes: bool) -> Result<bool> {
        let agents = match self.client.list_agents() {
            Ok(agents) => agents,
            Err(err) => {
                println!("Error listing agents: {err}");
                return Ok(false);
            }
        };
        if agents.is_empty() {
            println!("No agents found.");
            return Ok(true);
        }

        println!("Found {} agent(s):", agents.len());
        for agent in &agents {
            println!("  {} ({})", agent.id, agent.name);
        }

        if !assume_yes {
            print!("\nAre you sure you want to delete all agents? (y/N) ");
            io::stdout().flush().context("flush prompt")?;
            let confirmed =
                read_confirmation(&mut io::stdin().lock()).context("read confirmation")?;
            if !confirmed {
                println!("Aborted.");
                return Ok(true);
            }
        }

        let (report, ok) = match self.client.delete_all_agents() {
            Ok(report) => (report, true),
            Err(LettaError::PartialDelete(report)) => (report, false),
            Err(err) => {
                println!("✗ Error deleting agents: {err}");
                return Ok(false);
            }
        };
        for line in report_lines(&report) {
            println!("{line}");
        }
        Ok(ok)
    }
}
