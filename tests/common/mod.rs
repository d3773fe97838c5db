//! In-process fake Letta server for integration tests.
//!
//! Agents live in memory. The server speaks the pip or docker memory format
//! depending on how it was started, and can be told to misbehave.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use letta_npc::ServerVariant;
use serde_json::{Value, json};
use tiny_http::{Header, Method, Request, Response, Server};

#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub body: Value,
    pub headers: Vec<(String, String)>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Clone, Debug)]
struct Block {
    value: String,
    limit: u64,
}

#[derive(Clone, Debug)]
struct FakeAgent {
    id: String,
    name: String,
    system: String,
    human: Block,
    persona: Block,
}

impl FakeAgent {
    fn memory_json(&self) -> Value {
        json!({
            "memory": {
                "human": {"value": self.human.value, "limit": self.human.limit, "label": "human"},
                "persona": {"value": self.persona.value, "limit": self.persona.limit, "label": "persona"}
            }
        })
    }

    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "created_at": "2024-11-02T10:00:00Z",
            "system": self.system,
            "memory": self.memory_json()["memory"],
            "llm_config": {"model": "letta-free", "model_endpoint_type": "openai", "context_window": 16384},
        })
    }
}

#[derive(Default)]
struct State {
    agents: BTreeMap<String, FakeAgent>,
    next_id: u64,
    requests: Vec<Recorded>,
    fail_delete: HashSet<String>,
    vanish_on_delete: HashSet<String>,
    reject_create: bool,
    unhealthy: bool,
    reply_override: Option<Value>,
    delay: Option<Duration>,
}

pub struct FakeLetta {
    pub base_url: String,
    variant: ServerVariant,
    state: Arc<Mutex<State>>,
    server: Arc<Server>,
    handle: Option<JoinHandle<()>>,
}

impl FakeLetta {
    pub fn start(variant: ServerVariant) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("bind fake server"));
        let port = server
            .server_addr()
            .to_ip()
            .expect("tcp listener")
            .port();
        let state = Arc::new(Mutex::new(State::default()));

        let handle = {
            let server = Arc::clone(&server);
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for request in server.incoming_requests() {
                    handle_request(request, variant, &state);
                }
            })
        };

        FakeLetta {
            base_url: format!("http://127.0.0.1:{port}"),
            variant,
            state,
            server,
            handle: Some(handle),
        }
    }

    pub fn config(&self) -> letta_npc::ClientConfig {
        letta_npc::ClientConfig::new(&self.base_url, self.variant)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_matching(&self, method: &str, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    pub fn agent_count(&self) -> usize {
        self.state.lock().unwrap().agents.len()
    }

    /// Insert an agent directly, bypassing the API.
    pub fn seed_agent(&self, human: &str, persona: &str) -> String {
        let mut state = self.state.lock().unwrap();
        insert_agent(&mut state, "seeded".to_string(), String::new(), human, persona)
    }

    /// Make `DELETE` on this agent fail with a 500.
    pub fn fail_delete(&self, agent_id: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_delete
            .insert(agent_id.to_string());
    }

    /// Remove this agent just before its `DELETE` arrives, so the call sees 404.
    pub fn vanish_on_delete(&self, agent_id: &str) {
        self.state
            .lock()
            .unwrap()
            .vanish_on_delete
            .insert(agent_id.to_string());
    }

    pub fn reject_create(&self) {
        self.state.lock().unwrap().reject_create = true;
    }

    pub fn set_unhealthy(&self) {
        self.state.lock().unwrap().unhealthy = true;
    }

    pub fn override_reply(&self, body: Value) {
        self.state.lock().unwrap().reply_override = Some(body);
    }

    pub fn delay_responses(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }
}

impl Drop for FakeLetta {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn insert_agent(
    state: &mut State,
    name: String,
    system: String,
    human: &str,
    persona: &str,
) -> String {
    state.next_id += 1;
    let id = format!("agent-{:04}", state.next_id);
    state.agents.insert(
        id.clone(),
        FakeAgent {
            id: id.clone(),
            name,
            system,
            human: Block {
                value: human.to_string(),
                limit: 2000,
            },
            persona: Block {
                value: persona.to_string(),
                limit: 2000,
            },
        },
    );
    id
}

fn handle_request(mut request: Request, variant: ServerVariant, state: &Mutex<State>) {
    let mut raw = String::new();
    let _ = request.as_reader().read_to_string(&mut raw);
    let body: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);
    let method = request.method().to_string();
    let path = request.url().split('?').next().unwrap_or("").to_string();
    let headers = request
        .headers()
        .iter()
        .map(|h| (h.field.to_string(), h.value.to_string()))
        .collect();

    let delay = {
        let mut state = state.lock().unwrap();
        state.requests.push(Recorded {
            method: method.clone(),
            path: path.clone(),
            body: body.clone(),
            headers,
        });
        state.delay
    };
    if let Some(delay) = delay {
        thread::sleep(delay);
    }

    let (status, payload) = route(request.method(), &path, &body, variant, state);
    let header = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
    let response = Response::from_string(payload.to_string())
        .with_status_code(status)
        .with_header(header);
    let _ = request.respond(response);
}

fn route(
    method: &Method,
    path: &str,
    body: &Value,
    variant: ServerVariant,
    state: &Mutex<State>,
) -> (u16, Value) {
    let mut state = state.lock().unwrap();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (method, segments.as_slice()) {
        (Method::Get, ["v1", "health"]) => {
            if state.unhealthy {
                (503, json!({"status": "starting"}))
            } else {
                (200, json!({"status": "ok"}))
            }
        }
        (Method::Get, ["v1", "agents"]) => {
            let agents: Vec<Value> = state.agents.values().map(FakeAgent::to_json).collect();
            (200, Value::Array(agents))
        }
        (Method::Post, ["v1", "agents"]) => create(&mut state, body),
        (Method::Get, ["v1", "agents", id]) => match state.agents.get(*id) {
            Some(agent) => (200, agent.to_json()),
            None => not_found(id),
        },
        (Method::Delete, ["v1", "agents", id]) => {
            if state.fail_delete.contains(*id) {
                return (500, json!({"detail": "database is locked"}));
            }
            if state.vanish_on_delete.remove(*id) {
                state.agents.remove(*id);
            }
            match state.agents.remove(*id) {
                Some(_) => (200, Value::Null),
                None => not_found(id),
            }
        }
        (Method::Get, ["v1", "agents", id, "memory"]) => match state.agents.get(*id) {
            Some(agent) => (200, agent.memory_json()),
            None => not_found(id),
        },
        (Method::Patch, ["v1", "agents", id, "memory"]) => {
            let Some(agent) = state.agents.get_mut(*id) else {
                return not_found(id);
            };
            patch_memory(agent, body, variant)
        }
        (Method::Post, ["v1", "agents", id, "messages"]) => {
            let Some(agent) = state.agents.get(*id) else {
                return not_found(id);
            };
            if let Some(reply) = &state.reply_override {
                return (200, reply.clone());
            }
            let text = body["messages"][0]["text"].as_str().unwrap_or_default();
            (200, reply_for(agent, text))
        }
        _ => (404, json!({"detail": "Not Found"})),
    }
}

fn not_found(id: &str) -> (u16, Value) {
    (404, json!({"detail": format!("Agent id={id} not found")}))
}

fn create(state: &mut State, body: &Value) -> (u16, Value) {
    if state.reject_create {
        return (422, json!({"detail": "memory block limit must be positive"}));
    }
    let memory = &body["memory"];
    let (Some(human), Some(persona)) = (
        memory["human"]["value"].as_str(),
        memory["persona"]["value"].as_str(),
    ) else {
        return (422, json!({"detail": "memory requires human and persona blocks"}));
    };
    if memory["human"]["limit"].as_u64().unwrap_or(0) == 0 {
        return (422, json!({"detail": "memory block limit must be positive"}));
    }
    let name = body["name"].as_str().unwrap_or("unnamed").to_string();
    let system = body["system"].as_str().unwrap_or_default().to_string();
    let id = insert_agent(state, name, system, human, persona);
    (200, state.agents[&id].to_json())
}

fn patch_memory(agent: &mut FakeAgent, body: &Value, variant: ServerVariant) -> (u16, Value) {
    match variant {
        ServerVariant::Pip => {
            let human = body.get("human").and_then(Value::as_str);
            let persona = body.get("persona").and_then(Value::as_str);
            if human.is_none() && persona.is_none() {
                return (422, json!({"detail": "expected human or persona"}));
            }
            if let Some(value) = human {
                agent.human.value = value.to_string();
            }
            if let Some(value) = persona {
                agent.persona.value = value.to_string();
            }
        }
        ServerVariant::Docker => {
            let memory = &body["memory"];
            let (Some(human), Some(persona)) = (
                memory["human"]["value"].as_str(),
                memory["persona"]["value"].as_str(),
            ) else {
                return (422, json!({"detail": "complete memory structure required"}));
            };
            agent.human.value = human.to_string();
            agent.persona.value = persona.to_string();
            if let Some(limit) = memory["human"]["limit"].as_u64() {
                agent.human.limit = limit;
            }
            if let Some(limit) = memory["persona"]["limit"].as_u64() {
                agent.persona.limit = limit;
            }
        }
    }
    (200, agent.memory_json())
}

/// Echo the persona so tests can observe memory changes through replies.
fn reply_for(agent: &FakeAgent, text: &str) -> Value {
    let reply = format!("({}) You asked: {text}", agent.persona.value);
    json!({
        "messages": [
            {
                "role": "assistant",
                "text": "The player is curious. I should answer in character.",
                "tool_calls": [{
                    "id": "call-1",
                    "function": {
                        "name": "core_memory_append",
                        "arguments": json!({"label": "human", "content": text}).to_string()
                    }
                }]
            },
            {"role": "tool", "text": "{\"status\": \"OK\"}"},
            {
                "role": "assistant",
                "text": "Decoy assistant text that must never be returned.",
                "tool_calls": [{
                    "id": "call-2",
                    "function": {
                        "name": "send_message",
                        "arguments": json!({"message": reply}).to_string()
                    }
                }]
            }
        ],
        "usage": {"total_tokens": 42}
    })
}
