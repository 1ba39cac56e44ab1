//! Transport between the popup and the background controller

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use reqwest::StatusCode;
use tracing::debug;

use crate::{
    api::{handlers::dispatch, Ack, ControlMessage, ControlReply},
    state::AppState,
};

/// Sends control messages and waits for the asynchronous reply
pub trait ControlClient: Send + Sync {
    fn send(&self, message: ControlMessage) -> BoxFuture<'_, Result<ControlReply, String>>;
}

/// Client for a daemon reachable over HTTP
#[derive(Debug, Clone)]
pub struct HttpControlClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpControlClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }
}

impl ControlClient for HttpControlClient {
    fn send(&self, message: ControlMessage) -> BoxFuture<'_, Result<ControlReply, String>> {
        async move {
            let url = format!("{}/message", self.base_url);
            debug!("Sending {} to {}", message.action(), url);

            let response = self
                .http
                .post(&url)
                .json(&message)
                .send()
                .await
                .map_err(|e| format!("Failed to reach the timer daemon at {}: {}", self.base_url, e))?;

            let status = response.status();
            if status == StatusCode::UNPROCESSABLE_ENTITY {
                let ack: Ack = response
                    .json()
                    .await
                    .map_err(|e| format!("Failed to decode rejection: {}", e))?;
                return Err(ack.error.unwrap_or_else(|| "message rejected".to_string()));
            }
            if !status.is_success() {
                return Err(format!("Timer daemon answered {}", status));
            }

            response
                .json::<ControlReply>()
                .await
                .map_err(|e| format!("Failed to decode reply: {}", e))
        }
        .boxed()
    }
}

/// Client that calls an in-process controller directly
#[derive(Clone)]
pub struct LocalControlClient {
    state: Arc<AppState>,
}

impl LocalControlClient {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl ControlClient for LocalControlClient {
    fn send(&self, message: ControlMessage) -> BoxFuture<'_, Result<ControlReply, String>> {
        futures::future::ready(dispatch(&self.state, message)).boxed()
    }
}
