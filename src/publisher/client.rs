/*
 *  Copyright 2025-2026 The catalog-relay Authors
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Publish client for the downstream search service.
//!
//! [`HttpPublishClient`] POSTs the record's raw JSON payload (the domain
//! DTO, not the outbox envelope) to the configured endpoint and classifies
//! the response:
//!
//! - 2xx: `Published`, or `AlreadyProcessed` when the body explicitly says
//!   so; idempotent re-delivery counts as success either way
//! - 4xx: `ClientRejected` with the body text, permanent
//! - 5xx: `ServerFailed`, transient
//! - connect error / timeout: `Unreachable`, transient
//!
//! Every call goes through the circuit breaker: while the downstream is
//! persistently failing, calls resolve to `Unreachable` without network
//! I/O.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::breaker::{BreakerConfig, CircuitBreaker};
use crate::error::PublishError;
use crate::models::outbox_message::OutboxMessage;

/// Successful outcome of a publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The downstream service accepted and indexed the payload.
    Published,
    /// The downstream service had already processed an equivalent message.
    AlreadyProcessed,
}

/// Acknowledgement body returned by the downstream service on 2xx.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum PublishAck {
    Published,
    AlreadyProcessed,
}

/// Abstraction over the downstream publish call.
///
/// The delivery scheduler depends on this trait; production wires in
/// [`HttpPublishClient`], tests wire in scripted implementations.
#[async_trait]
pub trait PublishClient: Send + Sync {
    /// Attempts to deliver one outbox message.
    async fn send(&self, message: &OutboxMessage) -> Result<PublishOutcome, PublishError>;
}

/// HTTP publish client with a bounded timeout and a circuit breaker.
pub struct HttpPublishClient {
    endpoint: String,
    http: reqwest::Client,
    breaker: CircuitBreaker,
}

impl HttpPublishClient {
    /// Creates a client for the given downstream endpoint.
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        breaker_config: BreakerConfig,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint: endpoint.into(),
            http,
            breaker: CircuitBreaker::new(breaker_config),
        })
    }

    /// Exposes the breaker state for observation.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    async fn dispatch(&self, message: &OutboxMessage) -> Result<PublishOutcome, PublishError> {
        debug!(id = %message.id, message_type = %message.message_type, "publishing outbox message");

        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(message.payload.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PublishError::Unreachable(format!("request timed out: {}", e))
                } else {
                    PublishError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        classify(status, &body)
    }
}

#[async_trait]
impl PublishClient for HttpPublishClient {
    async fn send(&self, message: &OutboxMessage) -> Result<PublishOutcome, PublishError> {
        if !self.breaker.try_acquire() {
            warn!(id = %message.id, "circuit breaker open, failing fast");
            return Err(PublishError::Unreachable("circuit breaker open".to_string()));
        }

        let result = self.dispatch(message).await;
        match &result {
            // Only transient failures push the breaker toward open; a 4xx
            // rejection proves the dependency alive.
            Err(error) if error.is_transient() => self.breaker.record_failure(),
            _ => self.breaker.record_success(),
        }

        result
    }
}

/// Maps an HTTP status and body to the publish outcome taxonomy.
pub(crate) fn classify(status: StatusCode, body: &str) -> Result<PublishOutcome, PublishError> {
    if status.is_success() {
        // A 2xx without a readable acknowledgement still counts as
        // published; prior processing must be signalled explicitly.
        return Ok(match serde_json::from_str::<PublishAck>(body) {
            Ok(PublishAck::AlreadyProcessed) => PublishOutcome::AlreadyProcessed,
            _ => PublishOutcome::Published,
        });
    }

    if status.is_client_error() {
        return Err(PublishError::ClientRejected(body.to_string()));
    }

    if status.is_server_error() {
        return Err(PublishError::ServerFailed(body.to_string()));
    }

    Err(PublishError::ServerFailed(format!(
        "unexpected status {}: {}",
        status, body
    )))
}
