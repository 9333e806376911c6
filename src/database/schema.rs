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

//! Diesel schema declarations, one module per backend.
//!
//! PostgreSQL uses native UUID and TIMESTAMP columns; SQLite stores UUIDs
//! as BLOB and timestamps as RFC3339 TEXT. The column sets are otherwise
//! identical and both map onto the same domain model.

#[cfg(feature = "postgres")]
pub mod postgres {
    diesel::table! {
        outbox_messages (id) {
            id -> Uuid,
            payload -> Text,
            message_type -> Text,
            status -> Text,
            retry_attempts -> Int4,
            error_message -> Text,
            created_at -> Timestamp,
            updated_at -> Timestamp,
        }
    }
}

#[cfg(feature = "sqlite")]
pub mod sqlite {
    diesel::table! {
        outbox_messages (id) {
            id -> Binary,
            payload -> Text,
            message_type -> Text,
            status -> Text,
            retry_attempts -> Integer,
            error_message -> Text,
            created_at -> Text,
            updated_at -> Text,
        }
    }
}
