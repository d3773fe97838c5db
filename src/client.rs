//! Async Letta REST client.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client as HttpClient, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{ClientConfig, ServerVariant};
use crate::constants::{APP_NAME, APP_VERSION};
use crate::error::{DeleteReport, LettaError, Result};
use crate::types::{Agent, CreateAgent, Memory, MemoryUpdate};
use crate::util::mask_key;
use crate::wire;

/// Thin wrapper around the Letta agent API.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone)]
pub struct LettaClient {
    base_url: String,
    base: Url,
    server_type: ServerVariant,
    http_client: HttpClient,
}

impl LettaClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url).map_err(|err| {
            LettaError::Config(format!("invalid server url {:?}: {err}", config.base_url))
        })?;
        if base.cannot_be_a_base() {
            return Err(LettaError::Config(format!(
                "server url {:?} cannot carry a path",
                config.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| LettaError::Config(format!("header name {name:?}: {err}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|err| LettaError::Config(format!("header {name}: {err}")))?;
            headers.insert(name, value);
        }
        if let Some(key) = &config.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|err| LettaError::Config(format!("api key: {err}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
            debug!(key = %mask_key(key), "using Letta API key");
        }

        let http_client = HttpClient::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .user_agent(format!("{APP_NAME}/{APP_VERSION}"))
            .build()
            .map_err(|err| LettaError::Config(format!("build http client: {err}")))?;

        Ok(LettaClient {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            base,
            server_type: config.server_type,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn server_type(&self) -> ServerVariant {
        self.server_type
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Create a new NPC agent and return the server's record of it.
    pub async fn create_agent(&self, request: &CreateAgent) -> Result<Agent> {
        let body = wire::create_agent_body(request, chrono::Utc::now().timestamp());
        let reply = self
            .request(Method::POST, &["v1", "agents"], Some(&body))
            .await?;
        if !reply.status.is_success() {
            return Err(LettaError::Creation {
                status: reply.status,
                body: reply.json.to_string(),
            });
        }
        let agent: Agent = decode(reply.json, "created agent")?;
        info!(agent_id = %agent.id, name = %agent.name, "created agent");
        Ok(agent)
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        let reply = self
            .request(Method::GET, &["v1", "agents", agent_id], None)
            .await?;
        decode(reply.expect_success(Some(agent_id))?, "agent")
    }

    pub async fn list_agents(&self) -> Result<Vec<Agent>> {
        let reply = self.request(Method::GET, &["v1", "agents"], None).await?;
        wire::parse_agent_list(reply.expect_success(None)?)
    }

    pub async fn delete_agent(&self, agent_id: &str) -> Result<()> {
        let reply = self
            .request(Method::DELETE, &["v1", "agents", agent_id], None)
            .await?;
        reply.expect_success(Some(agent_id))?;
        info!(agent_id, "deleted agent");
        Ok(())
    }

    /// Delete every agent on the server.
    ///
    /// Every agent is attempted. Agents that vanish before we reach them are
    /// reported as skipped; any other failure turns the whole call into
    /// [`LettaError::PartialDelete`].
    pub async fn delete_all_agents(&self) -> Result<DeleteReport> {
        let agents = self.list_agents().await?;
        let mut report = DeleteReport::default();

        for agent in agents {
            match self.delete_agent(&agent.id).await {
                Ok(()) => report.deleted.push(agent.id),
                Err(err) if err.is_not_found() => {
                    debug!(agent_id = %agent.id, "agent already gone");
                    report.skipped.push(agent.id);
                }
                Err(err) => {
                    warn!(agent_id = %agent.id, error = %err, "failed to delete agent");
                    report.failed.push((agent.id, err));
                }
            }
        }

        if report.is_clean() {
            Ok(report)
        } else {
            Err(LettaError::PartialDelete(report))
        }
    }

    // ── Messaging ────────────────────────────────────────────────────

    /// Send a player message and return the NPC's reply text.
    pub async fn send_message(&self, agent_id: &str, message: &str) -> Result<String> {
        let body = wire::message_body(message);
        let reply = self
            .request(Method::POST, &["v1", "agents", agent_id, "messages"], Some(&body))
            .await?;
        wire::extract_reply(&reply.expect_success(Some(agent_id))?)
    }

    // ── Memory ───────────────────────────────────────────────────────

    pub async fn get_memory(&self, agent_id: &str) -> Result<Memory> {
        let reply = self
            .request(Method::GET, &["v1", "agents", agent_id, "memory"], None)
            .await?;
        let json = reply.expect_success(Some(agent_id))?;
        Memory::from_value(&json).map_err(|source| LettaError::Decode {
            context: format!("memory of {agent_id}"),
            source,
        })
    }

    /// Change the given memory blocks, leaving the others untouched.
    pub async fn update_memory(&self, agent_id: &str, update: &MemoryUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }
        let current = match self.server_type {
            ServerVariant::Pip => None,
            ServerVariant::Docker => Some(self.get_memory(agent_id).await?),
        };
        let bodies = wire::memory_patch_bodies(self.server_type, update, current.as_ref())?;

        for body in &bodies {
            let reply = self
                .request(Method::PATCH, &["v1", "agents", agent_id, "memory"], Some(body))
                .await?;
            reply.expect_success(Some(agent_id))?;
        }
        info!(
            agent_id,
            human = update.human.is_some(),
            persona = update.persona.is_some(),
            "updated memory"
        );
        Ok(())
    }

    // ── Health ───────────────────────────────────────────────────────

    /// `true` when the server answers its health endpoint with 2xx.
    pub async fn health(&self) -> Result<bool> {
        let reply = self.request(Method::GET, &["v1", "health"], None).await?;
        Ok(reply.status.is_success())
    }

    // ── Transport ────────────────────────────────────────────────────

    /// Join percent-encoded `segments` onto the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn request(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
    ) -> Result<Reply> {
        let url = self.endpoint(segments);
        debug!(%method, %url, "letta request");

        let mut builder = self.http_client.request(method, url.clone());
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let url = url.to_string();
        let response = builder
            .send()
            .await
            .map_err(|err| LettaError::from_transport(&url, err))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| LettaError::from_transport(&url, err))?;
        let json = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or_else(|_| json!({ "raw": text }))
        };
        debug!(%status, "letta response");
        Ok(Reply { url, status, json })
    }
}

/// Status and decoded body of one round trip.
struct Reply {
    url: String,
    status: StatusCode,
    json: Value,
}

impl Reply {
    /// Map a non-2xx status to `NotFound` (for agent routes) or `Connectivity`.
    fn expect_success(self, agent_id: Option<&str>) -> Result<Value> {
        if self.status.is_success() {
            return Ok(self.json);
        }
        if self.status == StatusCode::NOT_FOUND {
            if let Some(agent_id) = agent_id {
                return Err(LettaError::NotFound {
                    agent_id: agent_id.to_string(),
                });
            }
        }
        Err(LettaError::Connectivity {
            url: self.url,
            reason: format!("unexpected status {}: {}", self.status, self.json),
        })
    }
}

fn decode<T: DeserializeOwned>(json: Value, context: &str) -> Result<T> {
    serde_json::from_value(json).map_err(|source| LettaError::Decode {
        context: context.to_string(),
        source,
    })
}
