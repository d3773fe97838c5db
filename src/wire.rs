//! Request bodies and response extraction for the Letta REST API.
//!
//! The pip and docker servers disagree on the memory payload they accept, so
//! every shape that depends on the variant lives here behind
//! [`ServerVariant`].

use serde_json::{Map, Value, json};

use crate::config::ServerVariant;
use crate::constants::{
    AGENT_TYPE, HUMAN_BLOCK_NAME, MEMORY_PROMPT_TEMPLATE, PERSONA_BLOCK_NAME, SEND_MESSAGE_TOOL,
};
use crate::error::{LettaError, Result};
use crate::types::{
    Agent, BlockLabel, CreateAgent, EmbeddingConfig, LlmConfig, Memory, MemoryBlock, MemoryUpdate,
};

// ── Requests ─────────────────────────────────────────────────────────

/// Body for `POST /v1/agents`.
pub fn create_agent_body(request: &CreateAgent, unix_secs: i64) -> Value {
    let memory = request.resolved_memory();
    let human = MemoryBlock::new(BlockLabel::Human, memory.human).named(HUMAN_BLOCK_NAME);
    let persona = MemoryBlock::new(BlockLabel::Persona, memory.persona).named(PERSONA_BLOCK_NAME);
    let llm_config = request.llm_config.clone().unwrap_or_else(LlmConfig::letta_free);
    let embedding_config = request
        .embedding_config
        .clone()
        .unwrap_or_else(EmbeddingConfig::letta_free);

    json!({
        "name": request.resolved_name(unix_secs),
        "memory": {
            "human": human,
            "persona": persona,
            "prompt_template": MEMORY_PROMPT_TEMPLATE,
        },
        "system": request.system_prompt(),
        "tools": [SEND_MESSAGE_TOOL],
        "agent_type": AGENT_TYPE,
        "llm_config": llm_config,
        "embedding_config": embedding_config,
    })
}

/// Body for `POST /v1/agents/{id}/messages`.
pub fn message_body(text: &str) -> Value {
    json!({
        "messages": [{
            "role": "user",
            "text": text,
        }],
        "return_message_object": true,
    })
}

/// `PATCH /v1/agents/{id}/memory` bodies for `update`.
///
/// A pip server takes one partial body per changed block. A docker server only
/// accepts the complete block structure, so unchanged blocks are carried over
/// from `current`, which must then be `Some`.
pub fn memory_patch_bodies(
    variant: ServerVariant,
    update: &MemoryUpdate,
    current: Option<&Memory>,
) -> Result<Vec<Value>> {
    if update.is_empty() {
        return Ok(Vec::new());
    }
    match variant {
        ServerVariant::Pip => Ok(update
            .changes()
            .map(|(label, value)| {
                let mut body = Map::new();
                body.insert(label.as_str().to_string(), Value::String(value.to_string()));
                Value::Object(body)
            })
            .collect()),
        ServerVariant::Docker => {
            let current = current.ok_or_else(|| {
                LettaError::Config("docker memory update needs the current memory".to_string())
            })?;
            Ok(vec![docker_memory_body(current, update)])
        }
    }
}

fn docker_memory_body(current: &Memory, update: &MemoryUpdate) -> Value {
    let mut merged = current.clone();
    for (label, value) in update.changes() {
        merged.block_mut(label).value = value.to_string();
    }

    let mut blocks = Map::new();
    for label in BlockLabel::ALL {
        let block = merged.block(label);
        blocks.insert(
            label.as_str().to_string(),
            json!({
                "value": block.value,
                "limit": block.limit,
                "name": block.name.clone().unwrap_or_else(|| format!("{label}_info")),
                "template": block.template,
                "label": label.as_str(),
            }),
        );
    }
    json!({ "memory": blocks })
}

// ── Responses ────────────────────────────────────────────────────────

/// Pull the NPC's reply out of a message response.
///
/// Only `send_message` tool calls on assistant messages count; plain assistant
/// text (inner monologue) is ignored.
pub fn extract_reply(response: &Value) -> Result<String> {
    let messages = response
        .get("messages")
        .and_then(|v| v.as_array())
        .ok_or_else(|| LettaError::Messaging("response has no `messages` array".to_string()))?;

    for message in messages {
        if message.get("role").and_then(|v| v.as_str()) != Some("assistant") {
            continue;
        }
        let Some(calls) = message.get("tool_calls").and_then(|v| v.as_array()) else {
            continue;
        };
        for call in calls {
            let Some(function) = call.get("function") else {
                continue;
            };
            if function.get("name").and_then(|v| v.as_str()) != Some(SEND_MESSAGE_TOOL) {
                continue;
            }
            return reply_from_arguments(function.get("arguments"));
        }
    }

    Err(LettaError::Messaging(
        "no send_message tool call in agent response".to_string(),
    ))
}

fn reply_from_arguments(arguments: Option<&Value>) -> Result<String> {
    let parsed = match arguments {
        Some(Value::String(raw)) => serde_json::from_str::<Value>(raw).map_err(|err| {
            LettaError::Messaging(format!("send_message arguments are not JSON: {err}"))
        })?,
        Some(Value::Object(map)) => Value::Object(map.clone()),
        _ => {
            return Err(LettaError::Messaging(
                "send_message call has no arguments".to_string(),
            ));
        }
    };
    parsed
        .get("message")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| LettaError::Messaging("send_message arguments lack `message`".to_string()))
}

/// Decode a list response, which is either a bare array or `{"agents": [...]}`.
pub fn parse_agent_list(body: Value) -> Result<Vec<Agent>> {
    let list = match body {
        Value::Object(mut map) if map.contains_key("agents") => {
            map.remove("agents").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(list).map_err(|source| LettaError::Decode {
        context: "agent list".to_string(),
        source,
    })
}
