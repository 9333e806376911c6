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

//! Outbox Writer
//!
//! Called synchronously by domain-write operations to record the event that
//! must reach the downstream search service. The writer serializes the
//! payload and inserts a `Created` record with the initial retry budget.
//! No network I/O happens here, so the write path never depends on the
//! downstream service's availability.
//!
//! For atomicity with the triggering domain write, use the in-transaction
//! entry points against the caller's open connection:
//!
//! ```rust,ignore
//! conn.transaction::<_, WriteError, _>(|conn| {
//!     diesel::insert_into(products::table).values(&product).execute(conn)?;
//!     writer.record_in_postgres(conn, &product, MessageType::ProductCreated)?;
//!     Ok(())
//! })?;
//! ```
//!
//! Both the domain write and the outbox record then commit or roll back
//! together. A payload that cannot be serialized aborts the whole
//! transaction: an accepted write is never silently missing its record.

use serde::Serialize;
use tracing::debug;

use crate::dal::DAL;
use crate::error::WriteError;
use crate::models::outbox_message::{
    MessageType, NewOutboxMessage, OutboxMessage, DEFAULT_RETRY_BUDGET,
};

/// Records outbox messages for domain writes.
#[derive(Clone)]
pub struct OutboxWriter {
    dal: DAL,
    retry_budget: i32,
}

impl OutboxWriter {
    /// Creates a writer with the default retry budget.
    pub fn new(dal: DAL) -> Self {
        Self {
            dal,
            retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }

    /// Overrides the initial retry budget assigned to new records.
    pub fn with_retry_budget(mut self, retry_budget: i32) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    /// Serializes `payload` and inserts a `Created` record in its own
    /// transaction.
    ///
    /// Calling this twice with equivalent payloads produces two independent
    /// records, each delivered at least once; deduplication is the
    /// downstream consumer's job.
    pub async fn record<T: Serialize>(
        &self,
        payload: &T,
        message_type: MessageType,
    ) -> Result<OutboxMessage, WriteError> {
        let new_message = self.encode(payload, message_type)?;
        let message = self.dal.outbox_message().create(new_message).await?;
        debug!(id = %message.id, message_type = %message.message_type, "outbox message recorded");
        Ok(message)
    }

    /// Serializes `payload` and inserts the record on the caller's open
    /// PostgreSQL connection, inside the caller's transaction.
    #[cfg(feature = "postgres")]
    pub fn record_in_postgres<T: Serialize>(
        &self,
        conn: &mut diesel::pg::PgConnection,
        payload: &T,
        message_type: MessageType,
    ) -> Result<OutboxMessage, WriteError> {
        let new_message = self.encode(payload, message_type)?;
        Ok(crate::dal::insert_postgres(conn, &new_message)?)
    }

    /// Serializes `payload` and inserts the record on the caller's open
    /// SQLite connection, inside the caller's transaction.
    #[cfg(feature = "sqlite")]
    pub fn record_in_sqlite<T: Serialize>(
        &self,
        conn: &mut diesel::sqlite::SqliteConnection,
        payload: &T,
        message_type: MessageType,
    ) -> Result<OutboxMessage, WriteError> {
        let new_message = self.encode(payload, message_type)?;
        Ok(crate::dal::insert_sqlite(conn, &new_message)?)
    }

    fn encode<T: Serialize>(
        &self,
        payload: &T,
        message_type: MessageType,
    ) -> Result<NewOutboxMessage, WriteError> {
        let payload = serde_json::to_string(payload)?;
        Ok(NewOutboxMessage {
            payload,
            message_type,
            retry_attempts: self.retry_budget,
        })
    }
}
