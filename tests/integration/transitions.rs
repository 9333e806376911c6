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

//! Status state machine tests driven through the delivery scheduler.

use std::sync::Arc;
use std::time::Duration;

use catalog_relay::models::catalog::Category;
use catalog_relay::{
    DeliveryScheduler, MessageStatus, MessageType, OutboxWriter, PublishError, PublishOutcome,
    StoreError, UniversalTimestamp, UniversalUuid,
};

use crate::fixtures::{harness, RejectingClient, ScriptedClient};

fn category() -> Category {
    Category {
        id: Some(1),
        title: "Power tools".to_string(),
        image: None,
    }
}

fn scheduler_interval() -> Duration {
    // Tests drive run_once directly; the interval never elapses.
    Duration::from_secs(3600)
}

#[tokio::test]
async fn published_on_first_attempt_succeeds() {
    let harness = harness().await;
    let writer = OutboxWriter::new(harness.dal.clone());
    let recorded = writer
        .record(&category(), MessageType::CategoryCreated)
        .await
        .unwrap();

    let client = ScriptedClient::new(vec![Ok(PublishOutcome::Published)]);
    let scheduler =
        DeliveryScheduler::new(harness.dal.clone(), client.clone(), scheduler_interval());
    scheduler.run_once().await.unwrap();

    let message = harness
        .dal
        .outbox_message()
        .get_by_id(recorded.id)
        .await
        .unwrap();
    assert_eq!(message.status, MessageStatus::Succeeded);
    // Success leaves the budget untouched.
    assert_eq!(message.retry_attempts, 3);
    assert_eq!(message.error_message, "");
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn already_processed_is_treated_as_success() {
    let harness = harness().await;
    let writer = OutboxWriter::new(harness.dal.clone());
    let recorded = writer
        .record(&category(), MessageType::CategoryUpdated)
        .await
        .unwrap();

    let client = ScriptedClient::new(vec![Ok(PublishOutcome::AlreadyProcessed)]);
    let scheduler = DeliveryScheduler::new(harness.dal.clone(), client, scheduler_interval());
    scheduler.run_once().await.unwrap();

    let message = harness
        .dal
        .outbox_message()
        .get_by_id(recorded.id)
        .await
        .unwrap();
    assert_eq!(message.status, MessageStatus::Succeeded);
    assert_eq!(message.retry_attempts, 3);
}

#[tokio::test]
async fn transient_failures_walk_down_the_budget_then_fail() {
    let harness = harness().await;
    let writer = OutboxWriter::new(harness.dal.clone());
    let recorded = writer
        .record(&category(), MessageType::CategoryCreated)
        .await
        .unwrap();

    let client = ScriptedClient::new(vec![
        Err(PublishError::ServerFailed("boom 1".to_string())),
        Err(PublishError::ServerFailed("boom 2".to_string())),
        Err(PublishError::ServerFailed("boom 3".to_string())),
    ]);
    let scheduler =
        DeliveryScheduler::new(harness.dal.clone(), client.clone(), scheduler_interval());
    let outbox = harness.dal.outbox_message();

    // Attempt 1: Created -> Retryable(2)
    scheduler.run_once().await.unwrap();
    let message = outbox.get_by_id(recorded.id).await.unwrap();
    assert_eq!(message.status, MessageStatus::Retryable);
    assert_eq!(message.retry_attempts, 2);
    assert_eq!(message.error_message, "");

    // Attempt 2: Retryable(2) -> Retryable(1)
    scheduler.run_once().await.unwrap();
    let message = outbox.get_by_id(recorded.id).await.unwrap();
    assert_eq!(message.status, MessageStatus::Retryable);
    assert_eq!(message.retry_attempts, 1);

    // Attempt 3: Retryable(1) -> Failed, with the last failure's detail.
    scheduler.run_once().await.unwrap();
    let message = outbox.get_by_id(recorded.id).await.unwrap();
    assert_eq!(message.status, MessageStatus::Failed);
    assert!(message.error_message.contains("boom 3"));
    assert_eq!(client.calls(), 3);

    // Terminal: a further pass never re-selects the record.
    scheduler.run_once().await.unwrap();
    assert_eq!(client.calls(), 3);
}

#[tokio::test]
async fn client_rejection_fails_on_first_attempt_regardless_of_budget() {
    let harness = harness().await;
    let writer = OutboxWriter::new(harness.dal.clone());
    let recorded = writer
        .record(&category(), MessageType::CategoryDeleted)
        .await
        .unwrap();

    let client = ScriptedClient::new(vec![Err(PublishError::ClientRejected(
        "unknown category shape".to_string(),
    ))]);
    let scheduler =
        DeliveryScheduler::new(harness.dal.clone(), client.clone(), scheduler_interval());
    scheduler.run_once().await.unwrap();

    let message = harness
        .dal
        .outbox_message()
        .get_by_id(recorded.id)
        .await
        .unwrap();
    assert_eq!(message.status, MessageStatus::Failed);
    assert!(message.error_message.contains("unknown category shape"));
    // The budget is untouched: no retry was ever scheduled.
    assert_eq!(message.retry_attempts, 3);
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn succeeded_records_are_never_reselected() {
    let harness = harness().await;
    let writer = OutboxWriter::new(harness.dal.clone());
    writer
        .record(&category(), MessageType::CategoryCreated)
        .await
        .unwrap();

    let client = ScriptedClient::new(vec![Ok(PublishOutcome::Published)]);
    let scheduler =
        DeliveryScheduler::new(harness.dal.clone(), client.clone(), scheduler_interval());
    scheduler.run_once().await.unwrap();
    scheduler.run_once().await.unwrap();
    scheduler.run_once().await.unwrap();

    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn one_bad_record_does_not_poison_the_batch() {
    let harness = harness().await;
    let writer = OutboxWriter::new(harness.dal.clone());
    let outbox = harness.dal.outbox_message();

    let ok_one = writer
        .record(&category(), MessageType::CategoryCreated)
        .await
        .unwrap();
    let rejected = writer
        .record(&17, MessageType::ProductDeleted)
        .await
        .unwrap();
    let ok_two = writer
        .record(&category(), MessageType::SubcategoryUpdated)
        .await
        .unwrap();

    let client = RejectingClient::new(MessageType::ProductDeleted);
    let scheduler =
        DeliveryScheduler::new(harness.dal.clone(), client.clone(), scheduler_interval());
    scheduler.run_once().await.unwrap();

    assert_eq!(
        outbox.get_by_id(ok_one.id).await.unwrap().status,
        MessageStatus::Succeeded
    );
    assert_eq!(
        outbox.get_by_id(rejected.id).await.unwrap().status,
        MessageStatus::Failed
    );
    assert_eq!(
        outbox.get_by_id(ok_two.id).await.unwrap().status,
        MessageStatus::Succeeded
    );
    assert_eq!(client.calls(), 3);
}

#[tokio::test]
async fn transition_on_missing_record_reports_not_found() {
    let harness = harness().await;
    let outbox = harness.dal.outbox_message();

    let phantom = catalog_relay::OutboxMessage {
        id: UniversalUuid::new_v4(),
        payload: "{}".to_string(),
        message_type: MessageType::ProductCreated,
        status: MessageStatus::Created,
        retry_attempts: 3,
        error_message: String::new(),
        created_at: UniversalTimestamp::now(),
        updated_at: UniversalTimestamp::now(),
    };

    let error = outbox.mark_succeeded(&phantom).await.unwrap_err();
    assert!(matches!(error, StoreError::NotFound(_)));

    let error = outbox.get_by_id(phantom.id).await.unwrap_err();
    assert!(matches!(error, StoreError::NotFound(_)));
}

#[tokio::test]
async fn stale_transition_cannot_leave_a_terminal_state() {
    let harness = harness().await;
    let writer = OutboxWriter::new(harness.dal.clone());
    let outbox = harness.dal.outbox_message();

    let recorded = writer
        .record(&category(), MessageType::CategoryCreated)
        .await
        .unwrap();
    outbox.mark_succeeded(&recorded).await.unwrap();

    // A second actor still holding the Created snapshot loses the race:
    // the commit is withheld and the terminal state stands.
    let error = outbox.mark_retryable(&recorded).await.unwrap_err();
    assert!(matches!(error, StoreError::StaleTransition { .. }));

    let error = outbox.mark_failed(&recorded, "late failure").await.unwrap_err();
    assert!(matches!(error, StoreError::StaleTransition { .. }));

    let message = outbox.get_by_id(recorded.id).await.unwrap();
    assert_eq!(message.status, MessageStatus::Succeeded);
    assert_eq!(message.retry_attempts, 3);
    assert_eq!(message.error_message, "");
}
