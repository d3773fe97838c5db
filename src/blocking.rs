//! Synchronous facade over [`crate::client::LettaClient`].
//!
//! Owns a current-thread tokio runtime and blocks on each call, so game scripts and the CLI
//! can use the client without an async context. Do not call these methods
//! from inside another tokio runtime.

use tokio::runtime::{Builder, Runtime};

use crate::client;
use crate::config::{ClientConfig, ServerVariant};
use crate::error::{DeleteReport, LettaError, Result};
use crate::types::{Agent, CreateAgent, Memory, MemoryUpdate};

pub struct LettaClient {
    runtime: Runtime,
    inner: client::LettaClient,
}

impl LettaClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(LettaError::Runtime)?;
        let inner = client::LettaClient::new(config)?;
        Ok(LettaClient { runtime, inner })
    }

    /// The async client this facade drives.
    pub fn async_client(&self) -> &client::LettaClient {
        &self.inner
    }

    pub fn base_url(&self) -> &str {
        self.inner.base_url()
    }

    pub fn server_type(&self) -> ServerVariant {
        self.inner.server_type()
    }

    pub fn create_agent(&self, request: &CreateAgent) -> Result<Agent> {
        self.runtime.block_on(self.inner.create_agent(request))
    }

    pub fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        self.runtime.block_on(self.inner.get_agent(agent_id))
    }

    pub fn list_agents(&self) -> Result<Vec<Agent>> {
        self.runtime.block_on(self.inner.list_agents())
    }

    pub fn delete_agent(&self, agent_id: &str) -> Result<()> {
        self.runtime.block_on(self.inner.delete_agent(agent_id))
    }

    pub fn delete_all_agents(&self) -> Result<DeleteReport> {
        self.runtime.block_on(self.inner.delete_all_agents())
    }

    pub fn send_message(&self, agent_id: &str, message: &str) -> Result<String> {
        self.runtime.block_on(self.inner.send_message(agent_id, message))
    }

    pub fn get_memory(&self, agent_id: &str) -> Result<Memory> {
        self.runtime.block_on(self.inner.get_memory(agent_id))
    }

    pub fn update_memory(&self, agent_id: &str, update: &MemoryUpdate) -> Result<()> {
        self.runtime.block_on(self.inner.update_memory(agent_id, update))
    }

    pub fn health(&self) -> Result<bool> {
        self.runtime.block_on(self.inner.health())
    }
}
