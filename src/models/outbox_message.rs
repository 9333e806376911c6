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

//! Outbox Message Model
//!
//! This module defines the domain structures for outbox messages: the unit
//! of deferred, reliable work recorded alongside a domain write and later
//! delivered to the downstream search service.
//!
//! The outbox pattern provides:
//! - Atomic domain write + event record (single transaction)
//! - At-least-once delivery with a bounded retry budget
//! - Durable failure detail for operator inspection

use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Initial retry budget assigned to every new outbox message.
///
/// A budget of 3 yields exactly three delivery attempts before the message
/// is marked `Failed`: the decision point is `retry_attempts > 1` and the
/// budget is decremented only when a retry is scheduled.
pub const DEFAULT_RETRY_BUDGET: i32 = 3;

/// Delivery status of an outbox message.
///
/// `Created` and `Retryable` are deliverable; `Succeeded` and `Failed` are
/// terminal and never left once entered. Statuses are persisted as TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageStatus {
    /// Freshly recorded, not yet attempted.
    Created,
    /// At least one transient failure; budget remains.
    Retryable,
    /// Delivered (or acknowledged as already processed downstream).
    Succeeded,
    /// Permanently failed; `error_message` carries the detail.
    Failed,
}

impl MessageStatus {
    /// The statuses the delivery scheduler selects for processing.
    pub const DELIVERABLE: [MessageStatus; 2] = [MessageStatus::Created, MessageStatus::Retryable];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Created => "Created",
            MessageStatus::Retryable => "Retryable",
            MessageStatus::Succeeded => "Succeeded",
            MessageStatus::Failed => "Failed",
        }
    }

    /// Whether no further transition is defined out of this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageStatus::Succeeded | MessageStatus::Failed)
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a persisted status string is not recognized.
#[derive(Debug, Error)]
#[error("unknown message status: {0}")]
pub struct ParseMessageStatusError(String);

impl FromStr for MessageStatus {
    type Err = ParseMessageStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(MessageStatus::Created),
            "Retryable" => Ok(MessageStatus::Retryable),
            "Succeeded" => Ok(MessageStatus::Succeeded),
            "Failed" => Ok(MessageStatus::Failed),
            other => Err(ParseMessageStatusError(other.to_string())),
        }
    }
}

/// Domain event kind carried by an outbox message.
///
/// One variant per entity and operation. The relay core treats this as an
/// opaque tag; it never affects delivery behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    CategoryCreated,
    CategoryUpdated,
    CategoryDeleted,
    SubcategoryCreated,
    SubcategoryUpdated,
    SubcategoryDeleted,
    ProductCreated,
    ProductUpdated,
    ProductDeleted,
    ProductTypeCreated,
    ProductTypeUpdated,
    ProductTypeDeleted,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::CategoryCreated => "CATEGORY_CREATED",
            MessageType::CategoryUpdated => "CATEGORY_UPDATED",
            MessageType::CategoryDeleted => "CATEGORY_DELETED",
            MessageType::SubcategoryCreated => "SUBCATEGORY_CREATED",
            MessageType::SubcategoryUpdated => "SUBCATEGORY_UPDATED",
            MessageType::SubcategoryDeleted => "SUBCATEGORY_DELETED",
            MessageType::ProductCreated => "PRODUCT_CREATED",
            MessageType::ProductUpdated => "PRODUCT_UPDATED",
            MessageType::ProductDeleted => "PRODUCT_DELETED",
            MessageType::ProductTypeCreated => "PRODUCT_TYPE_CREATED",
            MessageType::ProductTypeUpdated => "PRODUCT_TYPE_UPDATED",
            MessageType::ProductTypeDeleted => "PRODUCT_TYPE_DELETED",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a persisted message type string is not recognized.
#[derive(Debug, Error)]
#[error("unknown message type: {0}")]
pub struct ParseMessageTypeError(String);

impl FromStr for MessageType {
    type Err = ParseMessageTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CATEGORY_CREATED" => Ok(MessageType::CategoryCreated),
            "CATEGORY_UPDATED" => Ok(MessageType::CategoryUpdated),
            "CATEGORY_DELETED" => Ok(MessageType::CategoryDeleted),
            "SUBCATEGORY_CREATED" => Ok(MessageType::SubcategoryCreated),
            "SUBCATEGORY_UPDATED" => Ok(MessageType::SubcategoryUpdated),
            "SUBCATEGORY_DELETED" => Ok(MessageType::SubcategoryDeleted),
            "PRODUCT_CREATED" => Ok(MessageType::ProductCreated),
            "PRODUCT_UPDATED" => Ok(MessageType::ProductUpdated),
            "PRODUCT_DELETED" => Ok(MessageType::ProductDeleted),
            "PRODUCT_TYPE_CREATED" => Ok(MessageType::ProductTypeCreated),
            "PRODUCT_TYPE_UPDATED" => Ok(MessageType::ProductTypeUpdated),
            "PRODUCT_TYPE_DELETED" => Ok(MessageType::ProductTypeDeleted),
            other => Err(ParseMessageTypeError(other.to_string())),
        }
    }
}

/// An outbox message record (domain type).
///
/// `payload` and `message_type` are immutable once written: a record
/// represents one fact to be delivered. Only `status`, `retry_attempts`,
/// `error_message` and `updated_at` change afterwards, and only through the
/// DAL's guarded transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxMessage {
    /// Unique identifier, assigned at insert.
    pub id: UniversalUuid,
    /// JSON snapshot of the domain object at the moment of the triggering
    /// write (or its identifier, for deletions).
    pub payload: String,
    /// Domain event kind.
    pub message_type: MessageType,
    /// Current delivery status.
    pub status: MessageStatus,
    /// Remaining retry budget; non-increasing, never negative.
    pub retry_attempts: i32,
    /// Failure detail; empty until the record terminally fails.
    pub error_message: String,
    /// When the record was inserted.
    pub created_at: UniversalTimestamp,
    /// When the record was last transitioned.
    pub updated_at: UniversalTimestamp,
}

/// Structure for creating a new outbox message.
///
/// The id and timestamps are assigned at insert time.
#[derive(Debug, Clone)]
pub struct NewOutboxMessage {
    /// Pre-serialized JSON payload.
    pub payload: String,
    /// Domain event kind.
    pub message_type: MessageType,
    /// Initial retry budget.
    pub retry_attempts: i32,
}

impl NewOutboxMessage {
    /// Creates a new message with the default retry budget.
    pub fn new(payload: String, message_type: MessageType) -> Self {
        Self {
            payload,
            message_type,
            retry_attempts: DEFAULT_RETRY_BUDGET,
        }
    }
}
