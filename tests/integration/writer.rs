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

//! Outbox writer tests: record creation, at-least-once semantics,
//! serialization failure, and transactional coupling with a domain write.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::ser::Error as _;
use serde::{Serialize, Serializer};

use catalog_relay::models::catalog::Product;
use catalog_relay::{MessageStatus, MessageType, OutboxWriter, WriteError};

use crate::fixtures::harness;

fn product() -> Product {
    Product {
        id: Some(42),
        title: "Claw hammer".to_string(),
        description: "16oz claw hammer".to_string(),
        price: 24.5,
        in_stock: true,
        category_id: 1,
        subcategory_id: 2,
        product_type_id: 3,
    }
}

#[tokio::test]
async fn record_creates_a_created_message_with_full_budget() {
    let harness = harness().await;
    let writer = OutboxWriter::new(harness.dal.clone());

    let message = writer
        .record(&product(), MessageType::ProductCreated)
        .await
        .unwrap();

    assert_eq!(message.status, MessageStatus::Created);
    assert_eq!(message.retry_attempts, 3);
    assert_eq!(message.message_type, MessageType::ProductCreated);
    assert_eq!(message.error_message, "");

    let payload: Product = serde_json::from_str(&message.payload).unwrap();
    assert_eq!(payload, product());
}

#[tokio::test]
async fn deletion_events_carry_only_the_entity_id() {
    let harness = harness().await;
    let writer = OutboxWriter::new(harness.dal.clone());

    let message = writer.record(&42, MessageType::ProductDeleted).await.unwrap();
    assert_eq!(message.payload, "42");
}

#[tokio::test]
async fn equivalent_writes_produce_independent_records() {
    let harness = harness().await;
    let writer = OutboxWriter::new(harness.dal.clone());

    let first = writer
        .record(&product(), MessageType::ProductCreated)
        .await
        .unwrap();
    let second = writer
        .record(&product(), MessageType::ProductCreated)
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    let deliverable = harness.dal.outbox_message().list_deliverable().await.unwrap();
    assert_eq!(deliverable.len(), 2);
}

#[tokio::test]
async fn configured_retry_budget_is_applied() {
    let harness = harness().await;
    let writer = OutboxWriter::new(harness.dal.clone()).with_retry_budget(5);

    let message = writer
        .record(&product(), MessageType::ProductUpdated)
        .await
        .unwrap();
    assert_eq!(message.retry_attempts, 5);
}

struct Unserializable;

impl Serialize for Unserializable {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(S::Error::custom("payload cannot be encoded"))
    }
}

#[tokio::test]
async fn serialization_failure_creates_no_record() {
    let harness = harness().await;
    let writer = OutboxWriter::new(harness.dal.clone());

    let error = writer
        .record(&Unserializable, MessageType::ProductCreated)
        .await
        .unwrap_err();
    assert!(matches!(error, WriteError::Serialization(_)));

    let deliverable = harness.dal.outbox_message().list_deliverable().await.unwrap();
    assert!(deliverable.is_empty());
}

#[tokio::test]
async fn record_commits_with_the_caller_transaction() {
    let harness = harness().await;
    let writer = OutboxWriter::new(harness.dal.clone());

    let mut conn = SqliteConnection::establish(&harness.path).unwrap();
    let message = conn
        .transaction::<_, WriteError, _>(|conn| {
            // Stand-in for the domain write sharing this transaction.
            writer.record_in_sqlite(conn, &product(), MessageType::ProductCreated)
        })
        .unwrap();

    let stored = harness
        .dal
        .outbox_message()
        .get_by_id(message.id)
        .await
        .unwrap();
    assert_eq!(stored.status, MessageStatus::Created);
}

#[tokio::test]
async fn record_rolls_back_with_the_caller_transaction() {
    let harness = harness().await;
    let writer = OutboxWriter::new(harness.dal.clone());

    let mut conn = SqliteConnection::establish(&harness.path).unwrap();
    let result = conn.transaction::<(), WriteError, _>(|conn| {
        writer.record_in_sqlite(conn, &product(), MessageType::ProductCreated)?;
        // The domain write fails after the outbox insert; both roll back.
        Err(WriteError::from(diesel::result::Error::RollbackTransaction))
    });
    assert!(result.is_err());

    let deliverable = harness.dal.outbox_message().list_deliverable().await.unwrap();
    assert!(deliverable.is_empty());
}
