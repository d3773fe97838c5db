//! Command handlers behind `letta-manage`.
//!
//! [`AgentManager`] wraps a blocking client and prints human-readable output.
//! Rendering lives in plain functions so it can be checked without a server:
//!
//! | Module     | Responsibility                             |
//! |------------|--------------------------------------------|
//! | `commands` | `list`, `get`, `delete`, `delete-all`      |
//! | `render`   | Agent and memory formatting, confirmations |

mod commands;
mod render;

use letta_npc::LettaError;
use letta_npc::blocking::LettaClient;

pub struct AgentManager {
    client: LettaClient,
}

impl AgentManager {
    pub fn new(client: LettaClient) -> Self {
        AgentManager { client }
    }

    /// Verify the server is running, printing the outcome.
    pub fn check_server(&self) -> bool {
        match self.client.health() {
            Ok(true) => {
                println!("✓ Letta server is running ({})", self.client.server_type());
                true
            }
            Ok(false) => {
                println!("✗ Server not healthy at {}", self.client.base_url());
                false
            }
            Err(LettaError::Timeout { url }) => {
                println!("\n✗ Error: Letta server did not answer in time");
                println!("  URL: {url}");
                false
            }
            Err(err) => {
                println!("\n✗ Error: Could not connect to Letta server");
                println!("  URL: {}", self.client.base_url());
                tracing::debug!(error = %err, "health check failed");
                false
            }
        }
    }
}
