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

//! End-to-end pipeline tests: runner lifecycle and real HTTP failure
//! classification.

use std::sync::Arc;
use std::time::Duration;

use catalog_relay::models::catalog::Subcategory;
use catalog_relay::{
    BreakerConfig, DeliveryScheduler, HttpPublishClient, MessageStatus, MessageType, OutboxWriter,
    PublishOutcome, RelayConfig, RelayRunner,
};
use tempfile::TempDir;

use crate::fixtures::{harness, ScriptedClient};

fn subcategory() -> Subcategory {
    Subcategory {
        id: Some(3),
        title: "Drills".to_string(),
        image: None,
        category_id: 1,
    }
}

#[tokio::test]
async fn runner_delivers_in_background_and_shuts_down_cleanly() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("relay.db");
    let client = ScriptedClient::new(vec![Ok(PublishOutcome::Published)]);

    let runner = RelayRunner::builder()
        .database_url(path.to_str().unwrap())
        .publish_client(client.clone())
        .with_config(
            RelayConfig::builder()
                .poll_interval(Duration::from_millis(50))
                .build(),
        )
        .build()
        .await
        .unwrap();

    let writer = runner.writer();
    let recorded = writer
        .record(&subcategory(), MessageType::SubcategoryCreated)
        .await
        .unwrap();

    // Give the background loop a few passes.
    tokio::time::sleep(Duration::from_millis(400)).await;

    let message = runner
        .dal()
        .outbox_message()
        .get_by_id(recorded.id)
        .await
        .unwrap();
    assert_eq!(message.status, MessageStatus::Succeeded);

    runner.shutdown().await.unwrap();
}

#[tokio::test]
async fn unreachable_endpoint_schedules_a_retry() {
    let harness = harness().await;
    let writer = OutboxWriter::new(harness.dal.clone());
    let recorded = writer
        .record(&subcategory(), MessageType::SubcategoryUpdated)
        .await
        .unwrap();

    // Nothing listens on this port; the publish resolves to Unreachable.
    let client = HttpPublishClient::new(
        "http://127.0.0.1:1/messages",
        Duration::from_secs(1),
        BreakerConfig::default(),
    )
    .unwrap();

    let scheduler = DeliveryScheduler::new(
        harness.dal.clone(),
        Arc::new(client),
        Duration::from_secs(3600),
    );
    scheduler.run_once().await.unwrap();

    let message = harness
        .dal
        .outbox_message()
        .get_by_id(recorded.id)
        .await
        .unwrap();
    assert_eq!(message.status, MessageStatus::Retryable);
    assert_eq!(message.retry_attempts, 2);
}
