use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{models::Program, roster::ClientRoster};

pub const GENERIC_SEND_FAILURE: &str = "Failed to send program to client";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no client selected")]
    NoClientSelected,

    #[error("client `{0}` is not in your active client list")]
    UnknownClient(String),

    #[error("{0}")]
    Transport(String),

    #[error("invalid dispatch configuration: {0}")]
    Config(String),
}

/// Body posted to the delivery endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest<'a> {
    pub client_id: &'a str,
    pub program_data: Value,
    pub custom_message: Option<&'a str>,
    pub import_id: &'a str,
}

/// Confirmation that the endpoint accepted a program.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReceipt {
    pub client_id: String,
    pub import_id: String,
    pub sent_at: DateTime<Utc>,
    pub response: Value,
}

/// Sends a normalized program to one client. One request per call, never retried.
pub struct Dispatcher {
    http: HttpClient,
    endpoint: String,
}

impl Dispatcher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, DispatchError> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(DispatchError::Config("endpoint URL is empty".into()));
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::Config(e.to_string()))?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn send(
        &self,
        roster: &ClientRoster,
        client_id: &str,
        program: &Program,
        custom_message: Option<&str>,
        import_id: &str,
    ) -> Result<DispatchReceipt, DispatchError> {
        if client_id.trim().is_empty() {
            return Err(DispatchError::NoClientSelected);
        }
        if !roster.contains(client_id) {
            return Err(DispatchError::UnknownClient(client_id.to_string()));
        }

        let request = SendRequest {
            client_id,
            program_data: program.to_raw(),
            custom_message: custom_message.filter(|m| !m.trim().is_empty()),
            import_id,
        };

        debug!(client_id, import_id, endpoint = %self.endpoint, "sending program");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "program dispatch failed before a response");
                DispatchError::Transport(GENERIC_SEND_FAILURE.to_string())
            })?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        let accepted = body.get("success").and_then(Value::as_bool) != Some(false);
        if !status.is_success() || !accepted {
            let message = server_message(&body).unwrap_or(GENERIC_SEND_FAILURE);
            warn!(%status, reason = message, "delivery endpoint rejected program");
            return Err(DispatchError::Transport(message.to_string()));
        }

        info!(client_id, import_id, "program sent");
        Ok(DispatchReceipt {
            client_id: client_id.to_string(),
            import_id: import_id.to_string(),
            sent_at: Utc::now(),
            response: body,
        })
    }
}

fn server_message(body: &Value) -> Option<&str> {
    ["message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str).filter(|m| !m.is_empty()))
}
