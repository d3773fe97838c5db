//! Agent data model: memory blocks, model configs and the creation request.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{
    DEFAULT_BLOCK_LIMIT, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_CONTEXT_WINDOW,
    DEFAULT_OPENAI_EMBEDDING_DIM, DEFAULT_OPENAI_EMBEDDING_MODEL, DEFAULT_OPENAI_MODEL,
    EMBEDDING_CHUNK_SIZE, FREE_CONTEXT_WINDOW, FREE_EMBEDDING_DIM, FREE_EMBEDDING_ENDPOINT,
    FREE_LLM_ENDPOINT, FREE_MODEL,
};
use crate::error::{LettaError, Result};
use crate::util::env_first;

// ── Memory ───────────────────────────────────────────────────────────

/// The two memory blocks every NPC agent carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockLabel {
    /// What the NPC knows about the player.
    Human,
    /// The NPC's own personality.
    Persona,
}

impl BlockLabel {
    pub const ALL: [BlockLabel; 2] = [BlockLabel::Human, BlockLabel::Persona];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockLabel::Human => "human",
            BlockLabel::Persona => "persona",
        }
    }
}

impl fmt::Display for BlockLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single labelled memory block as the server stores it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryBlock {
    pub value: String,
    #[serde(default = "default_block_limit")]
    pub limit: usize,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub template: bool,
}

fn default_block_limit() -> usize {
    DEFAULT_BLOCK_LIMIT
}

impl MemoryBlock {
    pub fn new(label: BlockLabel, value: impl Into<String>) -> Self {
        MemoryBlock {
            value: value.into(),
            limit: DEFAULT_BLOCK_LIMIT,
            label: label.as_str().to_string(),
            name: None,
            template: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// An agent's core memory: player context plus NPC persona.
#[derive(Clone, Debug, PartialEq)]
pub struct Memory {
    pub human: MemoryBlock,
    pub persona: MemoryBlock,
}

impl Memory {
    pub fn block(&self, label: BlockLabel) -> &MemoryBlock {
        match label {
            BlockLabel::Human => &self.human,
            BlockLabel::Persona => &self.persona,
        }
    }

    pub fn block_mut(&mut self, label: BlockLabel) -> &mut MemoryBlock {
        match label {
            BlockLabel::Human => &mut self.human,
            BlockLabel::Persona => &mut self.persona,
        }
    }

    /// Extract the `human`/`persona` blocks from a server memory payload.
    ///
    /// Accepts the body wrapped in `{"memory": ...}` or bare, with blocks keyed
    /// by label or listed under `blocks`.
    pub fn from_value(value: &Value) -> std::result::Result<Memory, serde_json::Error> {
        let memory = value.get("memory").unwrap_or(value);
        Ok(Memory {
            human: find_block(memory, BlockLabel::Human)?,
            persona: find_block(memory, BlockLabel::Persona)?,
        })
    }
}

fn find_block(
    memory: &Value,
    label: BlockLabel,
) -> std::result::Result<MemoryBlock, serde_json::Error> {
    let raw = match memory.get(label.as_str()) {
        Some(block) => block.clone(),
        None => memory
            .get("blocks")
            .and_then(|blocks| blocks.as_array())
            .and_then(|blocks| {
                blocks.iter().find(|block| {
                    block.get("label").and_then(|v| v.as_str()) == Some(label.as_str())
                })
            })
            .cloned()
            .ok_or_else(|| {
                <serde_json::Error as serde::de::Error>::missing_field(label.as_str())
            })?,
    };
    let mut block: MemoryBlock = serde_json::from_value(raw)?;
    if block.label.is_empty() {
        block.label = label.as_str().to_string();
    }
    Ok(block)
}

/// A partial memory change. Blocks left as `None` are not touched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryUpdate {
    pub human: Option<String>,
    pub persona: Option<String>,
}

impl MemoryUpdate {
    pub fn human(mut self, value: impl Into<String>) -> Self {
        self.human = Some(value.into());
        self
    }

    pub fn persona(mut self, value: impl Into<String>) -> Self {
        self.persona = Some(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.human.is_none() && self.persona.is_none()
    }

    /// Changed blocks in a stable order (human first).
    pub fn changes(&self) -> impl Iterator<Item = (BlockLabel, &str)> {
        BlockLabel::ALL.into_iter().filter_map(move |label| {
            let value = match label {
                BlockLabel::Human => self.human.as_deref(),
                BlockLabel::Persona => self.persona.as_deref(),
            };
            value.map(|value| (label, value))
        })
    }
}

/// Initial memory text for a new NPC.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMemory {
    pub human: String,
    pub persona: String,
}

impl ChatMemory {
    pub fn new(human: impl Into<String>, persona: impl Into<String>) -> Self {
        ChatMemory {
            human: human.into(),
            persona: persona.into(),
        }
    }
}

// ── Model configuration ──────────────────────────────────────────────

/// Which language model serves an agent's replies.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub model_endpoint_type: String,
    pub model_endpoint: Option<String>,
    pub context_window: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put_inner_thoughts_in_kwargs: Option<bool>,
}

impl LlmConfig {
    /// The free hosted model.
    pub fn letta_free() -> Self {
        LlmConfig {
            model: FREE_MODEL.to_string(),
            model_endpoint_type: "openai".to_string(),
            model_endpoint: Some(FREE_LLM_ENDPOINT.to_string()),
            context_window: FREE_CONTEXT_WINDOW,
            put_inner_thoughts_in_kwargs: Some(true),
        }
    }

    /// An OpenAI-backed model, tunable through `LETTA_LLM_*` variables.
    ///
    /// The key itself is read by the server, but we refuse to build the config
    /// when `OPENAI_API_KEY` is missing so the agent does not fail later.
    pub fn openai_from_env() -> Result<Self> {
        Self::openai_with(env_first)
    }

    /// Same as [`LlmConfig::openai_from_env`], reading variables through `lookup`.
    pub fn openai_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&[&str]) -> Option<String>,
    {
        require_openai_key(&lookup)?;
        Ok(LlmConfig {
            model: lookup(&["LETTA_LLM_MODEL"]).unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            model_endpoint_type: lookup(&["LETTA_LLM_ENDPOINT_TYPE"])
                .unwrap_or_else(|| "openai".to_string()),
            model_endpoint: Some(
                lookup(&["LETTA_LLM_ENDPOINT"])
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            ),
            context_window: lookup_number(
                &lookup,
                "LETTA_LLM_CONTEXT_WINDOW",
                DEFAULT_OPENAI_CONTEXT_WINDOW,
            )?,
            put_inner_thoughts_in_kwargs: None,
        })
    }
}

/// Which embedding model indexes an agent's archival memory.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub embedding_endpoint_type: String,
    pub embedding_endpoint: Option<String>,
    pub embedding_model: String,
    pub embedding_dim: u32,
    pub embedding_chunk_size: Option<u32>,
}

impl EmbeddingConfig {
    pub fn letta_free() -> Self {
        EmbeddingConfig {
            embedding_endpoint_type: "hugging-face".to_string(),
            embedding_endpoint: Some(FREE_EMBEDDING_ENDPOINT.to_string()),
            embedding_model: FREE_MODEL.to_string(),
            embedding_dim: FREE_EMBEDDING_DIM,
            embedding_chunk_size: Some(EMBEDDING_CHUNK_SIZE),
        }
    }

    pub fn openai_from_env() -> Result<Self> {
        Self::openai_with(env_first)
    }

    pub fn openai_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&[&str]) -> Option<String>,
    {
        require_openai_key(&lookup)?;
        Ok(EmbeddingConfig {
            embedding_endpoint_type: lookup(&["LETTA_EMBEDDING_ENDPOINT_TYPE"])
                .unwrap_or_else(|| "openai".to_string()),
            embedding_endpoint: Some(
                lookup(&["LETTA_EMBEDDING_ENDPOINT"])
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            ),
            embedding_model: lookup(&["LETTA_EMBEDDING_MODEL"])
                .unwrap_or_else(|| DEFAULT_OPENAI_EMBEDDING_MODEL.to_string()),
            embedding_dim: lookup_number(
                &lookup,
                "LETTA_EMBEDDING_DIM",
                DEFAULT_OPENAI_EMBEDDING_DIM,
            )?,
            embedding_chunk_size: Some(EMBEDDING_CHUNK_SIZE),
        })
    }
}

fn require_openai_key<F>(lookup: &F) -> Result<()>
where
    F: Fn(&[&str]) -> Option<String>,
{
    if lookup(&["OPENAI_API_KEY"]).is_none() {
        return Err(LettaError::Config("OPENAI_API_KEY is not set".to_string()));
    }
    Ok(())
}

fn lookup_number<F>(lookup: &F, key: &str, default: u32) -> Result<u32>
where
    F: Fn(&[&str]) -> Option<String>,
{
    match lookup(&[key]) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| LettaError::Config(format!("{key} must be a number, got {raw:?}"))),
        None => Ok(default),
    }
}

// ── Agents ───────────────────────────────────────────────────────────

/// An agent record as returned by the server.
///
/// `memory` stays raw JSON because its shape differs between server variants;
/// use [`Agent::memory_blocks`] for the typed view.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub memory: Option<Value>,
    #[serde(default)]
    pub llm_config: Option<LlmConfig>,
    #[serde(default)]
    pub embedding_config: Option<EmbeddingConfig>,
}

impl Agent {
    /// Typed memory, when the record carries a decodable `memory` field.
    pub fn memory_blocks(&self) -> Option<Memory> {
        self.memory
            .as_ref()
            .and_then(|memory| Memory::from_value(memory).ok())
    }
}

/// Everything needed to spawn a new NPC agent.
///
/// ```ignore
/// let request = CreateAgent::new("merchant")
///     .memory("I am a new player.", "I am a friendly merchant.");
/// ```
#[derive(Clone, Debug)]
pub struct CreateAgent {
    pub npc_type: String,
    pub name: Option<String>,
    pub memory: Option<ChatMemory>,
    pub llm_config: Option<LlmConfig>,
    pub embedding_config: Option<EmbeddingConfig>,
}

impl CreateAgent {
    pub fn new(npc_type: impl Into<String>) -> Self {
        CreateAgent {
            npc_type: npc_type.into(),
            name: None,
            memory: None,
            llm_config: None,
            embedding_config: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn memory(mut self, human: impl Into<String>, persona: impl Into<String>) -> Self {
        self.memory = Some(ChatMemory::new(human, persona));
        self
    }

    pub fn llm_config(mut self, config: LlmConfig) -> Self {
        self.llm_config = Some(config);
        self
    }

    pub fn embedding_config(mut self, config: EmbeddingConfig) -> Self {
        self.embedding_config = Some(config);
        self
    }

    /// Caller memory, or a generic player/NPC pair derived from the NPC type.
    pub fn resolved_memory(&self) -> ChatMemory {
        self.memory.clone().unwrap_or_else(|| {
            ChatMemory::new("New player", format!("I am a {} NPC", self.npc_type))
        })
    }

    /// Explicit name, or `{npc_type}_{unix_seconds}`.
    pub fn resolved_name(&self, unix_secs: i64) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}_{unix_secs}", self.npc_type))
    }

    pub fn system_prompt(&self) -> String {
        format!(
            "You are a {} NPC in a Roblox game. Stay in character at all times.",
            self.npc_type
        )
    }
}
