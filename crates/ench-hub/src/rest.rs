//! REST client for a running hub

use crate::{Hub, HubError, HubResult};
use async_trait::async_trait;
use ench_core::{ServiceCall, State};
use reqwest::{header, Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Hub reached over its HTTP API with a long-lived access token
#[derive(Clone)]
pub struct RestHub {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl RestHub {
    /// Create a client for the hub at `base_url`
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> HubResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(ref token) => request.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn get(&self, path: &str) -> HubResult<Response> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.authorize(self.client.get(&url)).send().await?;
        Ok(response)
    }

    fn check_status(response: &Response, path: &str) -> HubResult<()> {
        let status = response.status();
        if !status.is_success() {
            return Err(HubError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }
        Ok(())
    }

    /// Decode the `/api/states` payload, skipping entries that are not valid states
    fn decode_states(body: Value) -> HubResult<Vec<State>> {
        let entries = match body {
            Value::Array(entries) => entries,
            other => {
                return Err(HubError::Decode(format!(
                    "expected a list of states, got {}",
                    type_name(&other)
                )))
            }
        };

        let total = entries.len();
        let states: Vec<State> = entries
            .into_iter()
            .filter_map(|entry| {
                let entity_id = entry
                    .get("entity_id")
                    .and_then(Value::as_str)
                    .unwrap_or("<missing>")
                    .to_string();
                match serde_json::from_value::<State>(entry) {
                    Ok(state) => Some(state),
                    Err(e) => {
                        warn!(entity_id = %entity_id, error = %e, "Skipping undecodable state");
                        None
                    }
                }
            })
            .collect();

        debug!(total, decoded = states.len(), "Fetched states");
        Ok(states)
    }
}

#[async_trait]
impl Hub for RestHub {
    #[instrument(skip(self), fields(hub = %self.base_url))]
    async fn states(&self) -> HubResult<Vec<State>> {
        let path = "/api/states";
        let response = self.get(path).await?;
        Self::check_status(&response, path)?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| HubError::Decode(e.to_string()))?;
        Self::decode_states(body)
    }

    #[instrument(skip(self, call), fields(hub = %self.base_url, service = %call.service_id()))]
    async fn call_service(&self, call: ServiceCall) -> HubResult<()> {
        let path = format!("/api/services/{}/{}", call.domain, call.service);
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .authorize(self.client.post(&url))
            .json(&call.service_data)
            .send()
            .await?;
        Self::check_status(&response, &path)?;

        debug!(context = %call.context.id, "Service called");
        Ok(())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
