//! Compile-time constants and tunables shared across the crate.

/// Application name used for config directories and the user agent.
pub const APP_NAME: &str = "letta-npc";
/// Application version injected from `Cargo.toml` at compile time.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default host when only a port or server type is configured.
pub const DEFAULT_HOST: &str = "localhost";
/// Default port of a pip-installed Letta server.
pub const PIP_DEFAULT_PORT: u16 = 8333;
/// Default port of a Letta server running in Docker.
pub const DOCKER_DEFAULT_PORT: u16 = 8283;
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// File name of the optional JSON client configuration.
pub const CONFIG_FILE_NAME: &str = "letta.json";

// ── Agent payload defaults ───────────────────────────────────────────

/// Character limit applied to every memory block the client writes.
pub const DEFAULT_BLOCK_LIMIT: usize = 2000;
/// Block name for the player-context memory on creation.
pub const HUMAN_BLOCK_NAME: &str = "player_info";
/// Block name for the NPC-personality memory on creation.
pub const PERSONA_BLOCK_NAME: &str = "npc_persona";
/// Jinja template the server uses to render memory blocks into the prompt.
pub const MEMORY_PROMPT_TEMPLATE: &str = "{% for block in memory.values() %}<{{ block.label }}>\n{{ block.value }}\n</{{ block.label }}>{% endfor %}";
/// Agent implementation requested on creation.
pub const AGENT_TYPE: &str = "memgpt_agent";
/// Name of the tool the agent uses to talk back to the player.
pub const SEND_MESSAGE_TOOL: &str = "send_message";

// ── Model presets ────────────────────────────────────────────────────

/// Free hosted model served by memgpt.ai.
pub const FREE_MODEL: &str = "letta-free";
pub const FREE_LLM_ENDPOINT: &str = "https://inference.memgpt.ai";
pub const FREE_CONTEXT_WINDOW: u32 = 16384;
pub const FREE_EMBEDDING_ENDPOINT: &str = "https://embeddings.memgpt.ai";
pub const FREE_EMBEDDING_DIM: u32 = 1024;
pub const EMBEDDING_CHUNK_SIZE: u32 = 300;

/// Defaults for agents backed by OpenAI directly.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_CONTEXT_WINDOW: u32 = 128_000;
pub const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_OPENAI_EMBEDDING_DIM: u32 = 1536;
