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

//! Backend-specific row models.
//!
//! PostgreSQL rows use native `Uuid`/`NaiveDateTime`; SQLite rows store
//! UUIDs as BLOB and timestamps as RFC3339 TEXT. Both convert to/from the
//! domain [`OutboxMessage`] at the DAL boundary, so business logic never
//! sees a backend-native type.

use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::error::StoreError;
use crate::models::outbox_message::{NewOutboxMessage, OutboxMessage};

#[cfg(feature = "postgres")]
pub mod postgres {
    use super::*;
    use crate::database::schema::postgres::outbox_messages;
    use chrono::NaiveDateTime;
    use diesel::prelude::*;
    use uuid::Uuid;

    #[derive(Debug, Queryable, Selectable)]
    #[diesel(table_name = outbox_messages)]
    #[diesel(check_for_backend(diesel::pg::Pg))]
    pub struct PgOutboxMessage {
        pub id: Uuid,
        pub payload: String,
        pub message_type: String,
        pub status: String,
        pub retry_attempts: i32,
        pub error_message: String,
        pub created_at: NaiveDateTime,
        pub updated_at: NaiveDateTime,
    }

    #[derive(Debug, Insertable)]
    #[diesel(table_name = outbox_messages)]
    pub struct NewPgOutboxMessage {
        pub id: Uuid,
        pub payload: String,
        pub message_type: String,
        pub status: String,
        pub retry_attempts: i32,
        pub error_message: String,
        pub created_at: NaiveDateTime,
        pub updated_at: NaiveDateTime,
    }

    impl NewPgOutboxMessage {
        pub fn from_domain(
            new_message: &NewOutboxMessage,
            id: UniversalUuid,
            now: UniversalTimestamp,
        ) -> Self {
            Self {
                id: id.as_uuid(),
                payload: new_message.payload.clone(),
                message_type: new_message.message_type.as_str().to_string(),
                status: crate::models::outbox_message::MessageStatus::Created
                    .as_str()
                    .to_string(),
                retry_attempts: new_message.retry_attempts,
                error_message: String::new(),
                created_at: now.to_naive(),
                updated_at: now.to_naive(),
            }
        }
    }

    impl TryFrom<PgOutboxMessage> for OutboxMessage {
        type Error = StoreError;

        fn try_from(row: PgOutboxMessage) -> Result<Self, Self::Error> {
            let status = row
                .status
                .parse()
                .map_err(|e| StoreError::CorruptRecord {
                    id: row.id.to_string(),
                    detail: format!("{}", e),
                })?;
            let message_type = row
                .message_type
                .parse()
                .map_err(|e| StoreError::CorruptRecord {
                    id: row.id.to_string(),
                    detail: format!("{}", e),
                })?;

            Ok(OutboxMessage {
                id: UniversalUuid(row.id),
                payload: row.payload,
                message_type,
                status,
                retry_attempts: row.retry_attempts,
                error_message: row.error_message,
                created_at: UniversalTimestamp::from_naive(row.created_at),
                updated_at: UniversalTimestamp::from_naive(row.updated_at),
            })
        }
    }
}

#[cfg(feature = "sqlite")]
pub mod sqlite {
    use super::*;
    use crate::database::schema::sqlite::outbox_messages;
    use diesel::prelude::*;

    #[derive(Debug, Queryable, Selectable)]
    #[diesel(table_name = outbox_messages)]
    #[diesel(check_for_backend(diesel::sqlite::Sqlite))]
    pub struct SqliteOutboxMessage {
        pub id: Vec<u8>,
        pub payload: String,
        pub message_type: String,
        pub status: String,
        pub retry_attempts: i32,
        pub error_message: String,
        pub created_at: String,
        pub updated_at: String,
    }

    #[derive(Debug, Insertable)]
    #[diesel(table_name = outbox_messages)]
    pub struct NewSqliteOutboxMessage {
        pub id: Vec<u8>,
        pub payload: String,
        pub message_type: String,
        pub status: String,
        pub retry_attempts: i32,
        pub error_message: String,
        pub created_at: String,
        pub updated_at: String,
    }

    impl NewSqliteOutboxMessage {
        pub fn from_domain(
            new_message: &NewOutboxMessage,
            id: UniversalUuid,
            now: UniversalTimestamp,
        ) -> Self {
            Self {
                id: id.as_bytes().to_vec(),
                payload: new_message.payload.clone(),
                message_type: new_message.message_type.as_str().to_string(),
                status: crate::models::outbox_message::MessageStatus::Created
                    .as_str()
                    .to_string(),
                retry_attempts: new_message.retry_attempts,
                error_message: String::new(),
                created_at: now.to_rfc3339(),
                updated_at: now.to_rfc3339(),
            }
        }
    }

    impl TryFrom<SqliteOutboxMessage> for OutboxMessage {
        type Error = StoreError;

        fn try_from(row: SqliteOutboxMessage) -> Result<Self, Self::Error> {
            let row_id = hex_id(&row.id);
            let id = UniversalUuid::from_bytes(&row.id).map_err(|e| StoreError::CorruptRecord {
                id: row_id.clone(),
                detail: format!("invalid uuid blob: {}", e),
            })?;
            let status = row.status.parse().map_err(|e| StoreError::CorruptRecord {
                id: row_id.clone(),
                detail: format!("{}", e),
            })?;
            let message_type =
                row.message_type
                    .parse()
                    .map_err(|e| StoreError::CorruptRecord {
                        id: row_id.clone(),
                        detail: format!("{}", e),
                    })?;
            let created_at = UniversalTimestamp::from_rfc3339(&row.created_at).map_err(|e| {
                StoreError::CorruptRecord {
                    id: row_id.clone(),
                    detail: format!("invalid created_at: {}", e),
                }
            })?;
            let updated_at = UniversalTimestamp::from_rfc3339(&row.updated_at).map_err(|e| {
                StoreError::CorruptRecord {
                    id: row_id,
                    detail: format!("invalid updated_at: {}", e),
                }
            })?;

            Ok(OutboxMessage {
                id,
                payload: row.payload,
                message_type,
                status,
                retry_attempts: row.retry_attempts,
                error_message: row.error_message,
                created_at,
                updated_at,
            })
        }
    }

    fn hex_id(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
