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

//! Outbox Message Data Access Layer with runtime backend selection.
//!
//! Provides the store contract the relay is built on: insert, point lookup,
//! the deliverable scan (`status IN (Created, Retryable)`), and the three
//! status transitions.
//!
//! Every transition is optimistic: the UPDATE is filtered on the record
//! still holding the status (and, for the budget decrement, the budget) the
//! caller's decision was based on. A transition that matches zero rows is
//! reported as [`StoreError::StaleTransition`] or [`StoreError::NotFound`]
//! and changes nothing, so terminal records can never be resurrected and a
//! budget can never be double-decremented, even if two relay processes race
//! on the same store.

use diesel::prelude::*;
use tracing::debug;

use super::DAL;
use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::error::StoreError;
use crate::models::outbox_message::{MessageStatus, NewOutboxMessage, OutboxMessage};

#[cfg(feature = "postgres")]
use super::models::postgres::{NewPgOutboxMessage, PgOutboxMessage};
#[cfg(feature = "sqlite")]
use super::models::sqlite::{NewSqliteOutboxMessage, SqliteOutboxMessage};

/// Result of a guarded status UPDATE, resolved inside the database closure.
#[derive(Debug)]
enum TransitionOutcome {
    /// The record was in the expected state and has been transitioned.
    Applied,
    /// No record exists for the id.
    Missing,
    /// The record exists but is no longer in the expected state.
    Stale { current_status: String },
}

fn finish_transition(
    id: UniversalUuid,
    expected: MessageStatus,
    outcome: TransitionOutcome,
) -> Result<(), StoreError> {
    match outcome {
        TransitionOutcome::Applied => Ok(()),
        TransitionOutcome::Missing => Err(StoreError::NotFound(id)),
        TransitionOutcome::Stale { current_status } => Err(StoreError::StaleTransition {
            id,
            detail: format!("expected status {}, found {}", expected, current_status),
        }),
    }
}

/// Inserts a new outbox message on an open PostgreSQL connection.
///
/// Runs as part of whatever transaction the connection currently holds, so
/// callers can couple the insert to a domain write.
#[cfg(feature = "postgres")]
pub(crate) fn insert_postgres(
    conn: &mut diesel::pg::PgConnection,
    new_message: &NewOutboxMessage,
) -> Result<OutboxMessage, StoreError> {
    use crate::database::schema::postgres::outbox_messages;

    let row = NewPgOutboxMessage::from_domain(
        new_message,
        UniversalUuid::new_v4(),
        UniversalTimestamp::now(),
    );
    let inserted: PgOutboxMessage = diesel::insert_into(outbox_messages::table)
        .values(&row)
        .get_result(conn)?;

    OutboxMessage::try_from(inserted)
}

/// Inserts a new outbox message on an open SQLite connection.
///
/// Runs as part of whatever transaction the connection currently holds, so
/// callers can couple the insert to a domain write.
#[cfg(feature = "sqlite")]
pub(crate) fn insert_sqlite(
    conn: &mut diesel::sqlite::SqliteConnection,
    new_message: &NewOutboxMessage,
) -> Result<OutboxMessage, StoreError> {
    use crate::database::schema::sqlite::outbox_messages;

    let row = NewSqliteOutboxMessage::from_domain(
        new_message,
        UniversalUuid::new_v4(),
        UniversalTimestamp::now(),
    );
    let inserted: SqliteOutboxMessage = diesel::insert_into(outbox_messages::table)
        .values(&row)
        .get_result(conn)?;

    OutboxMessage::try_from(inserted)
}

/// Data access layer for outbox message operations with runtime backend
/// selection.
#[derive(Clone)]
pub struct OutboxMessageDAL<'a> {
    dal: &'a DAL,
}

impl<'a> OutboxMessageDAL<'a> {
    /// Creates a new OutboxMessageDAL instance.
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Creates a new outbox message in its own transaction.
    ///
    /// Domain writes that need atomicity with their own statements should
    /// go through [`OutboxWriter`](crate::writer::OutboxWriter)'s
    /// in-transaction entry points instead.
    pub async fn create(&self, new_message: NewOutboxMessage) -> Result<OutboxMessage, StoreError> {
        crate::dispatch_backend!(
            self.dal.backend(),
            self.create_postgres(new_message).await,
            self.create_sqlite(new_message).await
        )
    }

    #[cfg(feature = "postgres")]
    async fn create_postgres(
        &self,
        new_message: NewOutboxMessage,
    ) -> Result<OutboxMessage, StoreError> {
        let conn = self
            .dal
            .database
            .get_postgres_connection()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        conn.interact(move |conn| insert_postgres(conn, &new_message))
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?
    }

    #[cfg(feature = "sqlite")]
    async fn create_sqlite(
        &self,
        new_message: NewOutboxMessage,
    ) -> Result<OutboxMessage, StoreError> {
        let conn = self
            .dal
            .database
            .get_sqlite_connection()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        conn.interact(move |conn| insert_sqlite(conn, &new_message))
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?
    }

    /// Retrieves a message by id, distinguishing `NotFound` from other
    /// failures.
    pub async fn get_by_id(&self, id: UniversalUuid) -> Result<OutboxMessage, StoreError> {
        crate::dispatch_backend!(
            self.dal.backend(),
            self.get_by_id_postgres(id).await,
            self.get_by_id_sqlite(id).await
        )
    }

    #[cfg(feature = "postgres")]
    async fn get_by_id_postgres(&self, id: UniversalUuid) -> Result<OutboxMessage, StoreError> {
        use crate::database::schema::postgres::outbox_messages;

        let conn = self
            .dal
            .database
            .get_postgres_connection()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let row: Option<PgOutboxMessage> = conn
            .interact(move |conn| {
                outbox_messages::table
                    .find(id.as_uuid())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        row.ok_or(StoreError::NotFound(id))
            .and_then(OutboxMessage::try_from)
    }

    #[cfg(feature = "sqlite")]
    async fn get_by_id_sqlite(&self, id: UniversalUuid) -> Result<OutboxMessage, StoreError> {
        use crate::database::schema::sqlite::outbox_messages;

        let conn = self
            .dal
            .database
            .get_sqlite_connection()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let id_bytes = id.as_bytes().to_vec();
        let row: Option<SqliteOutboxMessage> = conn
            .interact(move |conn| outbox_messages::table.find(id_bytes).first(conn).optional())
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        row.ok_or(StoreError::NotFound(id))
            .and_then(OutboxMessage::try_from)
    }

    /// Lists all deliverable messages (`Created` or `Retryable`), oldest
    /// first.
    ///
    /// Terminal records are never selected, which is what makes the state
    /// machine monotonic from the scheduler's point of view.
    pub async fn list_deliverable(&self) -> Result<Vec<OutboxMessage>, StoreError> {
        crate::dispatch_backend!(
            self.dal.backend(),
            self.list_deliverable_postgres().await,
            self.list_deliverable_sqlite().await
        )
    }

    #[cfg(feature = "postgres")]
    async fn list_deliverable_postgres(&self) -> Result<Vec<OutboxMessage>, StoreError> {
        use crate::database::schema::postgres::outbox_messages;

        let conn = self
            .dal
            .database
            .get_postgres_connection()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let rows: Vec<PgOutboxMessage> = conn
            .interact(move |conn| {
                outbox_messages::table
                    .filter(outbox_messages::status.eq_any(deliverable_statuses()))
                    .order(outbox_messages::created_at.asc())
                    .load(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        rows.into_iter().map(OutboxMessage::try_from).collect()
    }

    #[cfg(feature = "sqlite")]
    async fn list_deliverable_sqlite(&self) -> Result<Vec<OutboxMessage>, StoreError> {
        use crate::database::schema::sqlite::outbox_messages;

        let conn = self
            .dal
            .database
            .get_sqlite_connection()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let rows: Vec<SqliteOutboxMessage> = conn
            .interact(move |conn| {
                outbox_messages::table
                    .filter(outbox_messages::status.eq_any(deliverable_statuses()))
                    .order(outbox_messages::created_at.asc())
                    .load(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        rows.into_iter().map(OutboxMessage::try_from).collect()
    }

    /// Transitions a delivered message to `Succeeded`.
    ///
    /// The update is conditioned on the message still holding the status
    /// the caller observed; the retry budget is left untouched.
    pub async fn mark_succeeded(&self, message: &OutboxMessage) -> Result<(), StoreError> {
        debug!(id = %message.id, "marking outbox message succeeded");
        crate::dispatch_backend!(
            self.dal.backend(),
            self.mark_succeeded_postgres(message).await,
            self.mark_succeeded_sqlite(message).await
        )
    }

    #[cfg(feature = "postgres")]
    async fn mark_succeeded_postgres(&self, message: &OutboxMessage) -> Result<(), StoreError> {
        use crate::database::schema::postgres::outbox_messages;

        let conn = self
            .dal
            .database
            .get_postgres_connection()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let id = message.id.as_uuid();
        let observed_status = message.status.as_str();
        let outcome = conn
            .interact(move |conn| {
                let updated = diesel::update(
                    outbox_messages::table
                        .filter(outbox_messages::id.eq(id))
                        .filter(outbox_messages::status.eq(observed_status)),
                )
                .set((
                    outbox_messages::status.eq(MessageStatus::Succeeded.as_str()),
                    outbox_messages::updated_at.eq(UniversalTimestamp::now().to_naive()),
                ))
                .execute(conn)?;

                resolve_outcome_postgres(conn, id, updated)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        finish_transition(message.id, message.status, outcome)
    }

    #[cfg(feature = "sqlite")]
    async fn mark_succeeded_sqlite(&self, message: &OutboxMessage) -> Result<(), StoreError> {
        use crate::database::schema::sqlite::outbox_messages;

        let conn = self
            .dal
            .database
            .get_sqlite_connection()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let id_bytes = message.id.as_bytes().to_vec();
        let observed_status = message.status.as_str();
        let outcome = conn
            .interact(move |conn| {
                let updated = diesel::update(
                    outbox_messages::table
                        .filter(outbox_messages::id.eq(id_bytes.clone()))
                        .filter(outbox_messages::status.eq(observed_status)),
                )
                .set((
                    outbox_messages::status.eq(MessageStatus::Succeeded.as_str()),
                    outbox_messages::updated_at.eq(UniversalTimestamp::now().to_rfc3339()),
                ))
                .execute(conn)?;

                resolve_outcome_sqlite(conn, id_bytes, updated)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        finish_transition(message.id, message.status, outcome)
    }

    /// Transitions a message to `Retryable` after a transient failure,
    /// consuming one unit of retry budget.
    ///
    /// Conditioned on both the observed status and the observed budget, so
    /// a racing relay cannot decrement the budget twice for one attempt.
    pub async fn mark_retryable(&self, message: &OutboxMessage) -> Result<(), StoreError> {
        debug!(
            id = %message.id,
            remaining = message.retry_attempts - 1,
            "marking outbox message retryable"
        );
        crate::dispatch_backend!(
            self.dal.backend(),
            self.mark_retryable_postgres(message).await,
            self.mark_retryable_sqlite(message).await
        )
    }

    #[cfg(feature = "postgres")]
    async fn mark_retryable_postgres(&self, message: &OutboxMessage) -> Result<(), StoreError> {
        use crate::database::schema::postgres::outbox_messages;

        let conn = self
            .dal
            .database
            .get_postgres_connection()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let id = message.id.as_uuid();
        let observed_status = message.status.as_str();
        let observed_attempts = message.retry_attempts;
        let outcome = conn
            .interact(move |conn| {
                let updated = diesel::update(
                    outbox_messages::table
                        .filter(outbox_messages::id.eq(id))
                        .filter(outbox_messages::status.eq(observed_status))
                        .filter(outbox_messages::retry_attempts.eq(observed_attempts)),
                )
                .set((
                    outbox_messages::status.eq(MessageStatus::Retryable.as_str()),
                    outbox_messages::retry_attempts.eq(observed_attempts - 1),
                    outbox_messages::updated_at.eq(UniversalTimestamp::now().to_naive()),
                ))
                .execute(conn)?;

                resolve_outcome_postgres(conn, id, updated)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        finish_transition(message.id, message.status, outcome)
    }

    #[cfg(feature = "sqlite")]
    async fn mark_retryable_sqlite(&self, message: &OutboxMessage) -> Result<(), StoreError> {
        use crate::database::schema::sqlite::outbox_messages;

        let conn = self
            .dal
            .database
            .get_sqlite_connection()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let id_bytes = message.id.as_bytes().to_vec();
        let observed_status = message.status.as_str();
        let observed_attempts = message.retry_attempts;
        let outcome = conn
            .interact(move |conn| {
                let updated = diesel::update(
                    outbox_messages::table
                        .filter(outbox_messages::id.eq(id_bytes.clone()))
                        .filter(outbox_messages::status.eq(observed_status))
                        .filter(outbox_messages::retry_attempts.eq(observed_attempts)),
                )
                .set((
                    outbox_messages::status.eq(MessageStatus::Retryable.as_str()),
                    outbox_messages::retry_attempts.eq(observed_attempts - 1),
                    outbox_messages::updated_at.eq(UniversalTimestamp::now().to_rfc3339()),
                ))
                .execute(conn)?;

                resolve_outcome_sqlite(conn, id_bytes, updated)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        finish_transition(message.id, message.status, outcome)
    }

    /// Transitions a message to `Failed`, recording the failure detail.
    ///
    /// Used both for exhausted retry budgets and for permanent rejections;
    /// the remaining budget is left as-is for operator inspection.
    pub async fn mark_failed(
        &self,
        message: &OutboxMessage,
        error_message: &str,
    ) -> Result<(), StoreError> {
        debug!(id = %message.id, "marking outbox message failed");
        crate::dispatch_backend!(
            self.dal.backend(),
            self.mark_failed_postgres(message, error_message).await,
            self.mark_failed_sqlite(message, error_message).await
        )
    }

    #[cfg(feature = "postgres")]
    async fn mark_failed_postgres(
        &self,
        message: &OutboxMessage,
        error_message: &str,
    ) -> Result<(), StoreError> {
        use crate::database::schema::postgres::outbox_messages;

        let conn = self
            .dal
            .database
            .get_postgres_connection()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let id = message.id.as_uuid();
        let observed_status = message.status.as_str();
        let error_message = error_message.to_string();
        let outcome = conn
            .interact(move |conn| {
                let updated = diesel::update(
                    outbox_messages::table
                        .filter(outbox_messages::id.eq(id))
                        .filter(outbox_messages::status.eq(observed_status)),
                )
                .set((
                    outbox_messages::status.eq(MessageStatus::Failed.as_str()),
                    outbox_messages::error_message.eq(error_message),
                    outbox_messages::updated_at.eq(UniversalTimestamp::now().to_naive()),
                ))
                .execute(conn)?;

                resolve_outcome_postgres(conn, id, updated)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        finish_transition(message.id, message.status, outcome)
    }

    #[cfg(feature = "sqlite")]
    async fn mark_failed_sqlite(
        &self,
        message: &OutboxMessage,
        error_message: &str,
    ) -> Result<(), StoreError> {
        use crate::database::schema::sqlite::outbox_messages;

        let conn = self
            .dal
            .database
            .get_sqlite_connection()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let id_bytes = message.id.as_bytes().to_vec();
        let observed_status = message.status.as_str();
        let error_message = error_message.to_string();
        let outcome = conn
            .interact(move |conn| {
                let updated = diesel::update(
                    outbox_messages::table
                        .filter(outbox_messages::id.eq(id_bytes.clone()))
                        .filter(outbox_messages::status.eq(observed_status)),
                )
                .set((
                    outbox_messages::status.eq(MessageStatus::Failed.as_str()),
                    outbox_messages::error_message.eq(error_message),
                    outbox_messages::updated_at.eq(UniversalTimestamp::now().to_rfc3339()),
                ))
                .execute(conn)?;

                resolve_outcome_sqlite(conn, id_bytes, updated)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        finish_transition(message.id, message.status, outcome)
    }
}

fn deliverable_statuses() -> Vec<&'static str> {
    MessageStatus::DELIVERABLE
        .iter()
        .map(|s| s.as_str())
        .collect()
}

#[cfg(feature = "postgres")]
fn resolve_outcome_postgres(
    conn: &mut diesel::pg::PgConnection,
    id: uuid::Uuid,
    updated: usize,
) -> diesel::QueryResult<TransitionOutcome> {
    use crate::database::schema::postgres::outbox_messages;

    if updated > 0 {
        return Ok(TransitionOutcome::Applied);
    }

    let current: Option<String> = outbox_messages::table
        .find(id)
        .select(outbox_messages::status)
        .first(conn)
        .optional()?;

    Ok(match current {
        None => TransitionOutcome::Missing,
        Some(current_status) => TransitionOutcome::Stale { current_status },
    })
}

#[cfg(feature = "sqlite")]
fn resolve_outcome_sqlite(
    conn: &mut diesel::sqlite::SqliteConnection,
    id: Vec<u8>,
    updated: usize,
) -> diesel::QueryResult<TransitionOutcome> {
    use crate::database::schema::sqlite::outbox_messages;

    if updated > 0 {
        return Ok(TransitionOutcome::Applied);
    }

    let current: Option<String> = outbox_messages::table
        .find(id)
        .select(outbox_messages::status)
        .first(conn)
        .optional()?;

    Ok(match current {
        None => TransitionOutcome::Missing,
        Some(current_status) => TransitionOutcome::Stale { current_status },
    })
}
