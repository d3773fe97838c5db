//! Lightweight client for running Letta agents as game NPCs.
//!
//! Create an agent with a `human` (player context) and `persona` (NPC
//! personality) memory block, talk to it, reshape its memory, and delete it.
//! All reasoning and persistence lives on the Letta server; this crate only
//! maps those operations onto its REST API.
//!
//! ```no_run
//! use letta_npc::{ClientConfig, CreateAgent, MemoryUpdate};
//! use letta_npc::blocking::LettaClient;
//!
//! # fn main() -> letta_npc::Result<()> {
//! let client = LettaClient::new(ClientConfig::default())?;
//! let agent = client.create_agent(
//!     &CreateAgent::new("merchant").memory("new player", "friendly merchant"),
//! )?;
//! let reply = client.send_message(&agent.id, "What items do you have?")?;
//! println!("{reply}");
//! client.update_memory(&agent.id, &MemoryUpdate::default().persona("rare item dealer"))?;
//! client.delete_agent(&agent.id)?;
//! # Ok(())
//! # }
//! ```

pub mod blocking;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod types;
pub mod util;
pub mod wire;

pub use client::LettaClient;
pub use config::{ClientConfig, ConfigFile, ConfigSource, ServerVariant};
pub use error::{DeleteReport, LettaError, Result};
pub use types::{
    Agent, BlockLabel, ChatMemory, CreateAgent, EmbeddingConfig, LlmConfig, Memory, MemoryBlock,
    MemoryUpdate,
};
