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

//! Error types for the outbox relay.
//!
//! Each layer has its own error enum so callers can match on the failure
//! classes that matter to them: the store distinguishes missing records and
//! lost optimistic races, the writer distinguishes serialization failures
//! (which must abort the caller's transaction) from storage failures, and
//! the publish client carries the transient/permanent taxonomy the retry
//! policy is built on.

use crate::database::universal_types::UniversalUuid;
use thiserror::Error;

/// Errors raised by the outbox record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failure obtaining a pooled connection or running the interact closure.
    #[error("database connection pool error: {0}")]
    ConnectionPool(String),

    /// Underlying database error.
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// No record exists for the given id. The scheduler logs and skips this
    /// rather than aborting the batch.
    #[error("outbox message not found: {0}")]
    NotFound(UniversalUuid),

    /// A status transition found the record no longer in the state the
    /// decision was based on. The commit was withheld; nothing changed.
    #[error("stale transition for outbox message {id}: {detail}")]
    StaleTransition { id: UniversalUuid, detail: String },

    /// A stored row could not be mapped back to the domain model.
    #[error("corrupt outbox row {id}: {detail}")]
    CorruptRecord { id: String, detail: String },

    /// Running embedded migrations failed.
    #[error("migration error: {0}")]
    Migration(String),
}

/// Errors raised while recording a new outbox message.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The payload could not be encoded. Fatal at write time: this
    /// propagates to the caller and aborts the surrounding transaction, so
    /// a record is never created from un-encodable data.
    #[error("failed to serialize outbox payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The insert itself failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// Lets the in-transaction writer entry points be used directly as the error
// type of a diesel transaction closure.
impl From<diesel::result::Error> for WriteError {
    fn from(error: diesel::result::Error) -> Self {
        WriteError::Store(StoreError::Database(error))
    }
}

/// Classified outcome of a failed publish attempt.
///
/// `ServerFailed` and `Unreachable` are transient: the payload is fine and a
/// later attempt may succeed. `ClientRejected` is permanent: the downstream
/// service refused the payload itself, and retrying cannot help.
#[derive(Debug, Error)]
pub enum PublishError {
    /// 4xx-equivalent response; the payload was rejected as invalid.
    #[error("downstream rejected payload: {0}")]
    ClientRejected(String),

    /// 5xx-equivalent response; the downstream service failed.
    #[error("downstream server error: {0}")]
    ServerFailed(String),

    /// Connection failure, timeout, or an open circuit breaker.
    #[error("downstream unreachable: {0}")]
    Unreachable(String),
}

impl PublishError {
    /// Whether a later delivery attempt may succeed without changing the
    /// payload.
    pub fn is_transient(&self) -> bool {
        match self {
            PublishError::ClientRejected(_) => false,
            PublishError::ServerFailed(_) | PublishError::Unreachable(_) => true,
        }
    }
}

/// Errors raised while building or stopping a [`RelayRunner`](crate::runner::RelayRunner).
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("scheduler task failed: {0}")]
    Join(String),
}
