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

//! Delivery Scheduler
//!
//! A periodic job that fetches every deliverable outbox record (`Created`
//! or `Retryable`), attempts publication through the
//! [`PublishClient`](crate::publisher::PublishClient), and applies the
//! status transition:
//!
//! - `Published` / `AlreadyProcessed` -> `Succeeded`
//! - transient failure with budget remaining -> `Retryable`, budget - 1
//! - transient failure with exhausted budget -> `Failed` + detail
//! - permanent rejection -> `Failed` + detail, regardless of budget
//!
//! Each record's transition commits independently: a failure on one record
//! is logged and skipped, never aborting the rest of the batch. Only a
//! failure of the batch query itself aborts a pass, to be retried on the
//! next tick. The run loop honors a shutdown signal between batches, so an
//! in-flight attempt finishes (or times out through the client) rather
//! than being killed mid-write.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::dal::DAL;
use crate::error::{PublishError, StoreError};
use crate::models::outbox_message::OutboxMessage;
use crate::publisher::{PublishClient, PublishOutcome};

/// The transition a delivery attempt resolved to.
#[derive(Debug, PartialEq, Eq)]
enum Transition {
    Succeed,
    Retry,
    Fail(String),
}

/// Applies the state machine to one attempt outcome.
///
/// Budget arithmetic: a record created with budget 3 gets exactly three
/// attempts. The decision point is `retry_attempts > 1`, and the budget is
/// decremented only when a retry is scheduled.
fn decide(message: &OutboxMessage, result: &Result<PublishOutcome, PublishError>) -> Transition {
    match result {
        Ok(_) => Transition::Succeed,
        Err(error) if error.is_transient() && message.retry_attempts > 1 => Transition::Retry,
        Err(error) => Transition::Fail(error.to_string()),
    }
}

/// The periodic outbox delivery job.
pub struct DeliveryScheduler {
    dal: DAL,
    client: Arc<dyn PublishClient>,
    poll_interval: Duration,
}

impl DeliveryScheduler {
    /// Creates a scheduler polling at `poll_interval`.
    pub fn new(dal: DAL, client: Arc<dyn PublishClient>, poll_interval: Duration) -> Self {
        Self {
            dal,
            client,
            poll_interval,
        }
    }

    /// Runs delivery passes until the shutdown signal flips to `true`.
    ///
    /// The first pass runs immediately; subsequent passes run once per
    /// poll interval. Outcomes are observable only through the persisted
    /// record statuses and the logs.
    pub async fn run_loop(&self, mut shutdown: watch::Receiver<bool>) {
        info!(interval = ?self.poll_interval, "delivery scheduler started");
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(error) = self.run_once().await {
                        error!(%error, "delivery pass aborted, will retry on next tick");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("delivery scheduler stopped");
    }

    /// Runs one delivery pass over all deliverable records.
    ///
    /// Aborts only if the batch query fails; per-record failures are
    /// isolated.
    pub async fn run_once(&self) -> Result<(), StoreError> {
        let messages = self.dal.outbox_message().list_deliverable().await?;

        if messages.is_empty() {
            debug!("no deliverable outbox messages");
            return Ok(());
        }

        info!(count = messages.len(), "delivering outbox messages");
        for message in &messages {
            if let Err(error) = self.deliver(message).await {
                // NotFound (record vanished) and StaleTransition (a
                // concurrent relay got there first) are skips, as is any
                // store failure on the transition. The record stays as-is
                // and is reconsidered on a later pass if still deliverable.
                warn!(id = %message.id, %error, "skipping outbox message");
            }
        }

        Ok(())
    }

    async fn deliver(&self, message: &OutboxMessage) -> Result<(), StoreError> {
        let result = self.client.send(message).await;
        let dal = self.dal.outbox_message();

        match decide(message, &result) {
            Transition::Succeed => {
                debug!(id = %message.id, "outbox message delivered");
                dal.mark_succeeded(message).await
            }
            Transition::Retry => {
                warn!(
                    id = %message.id,
                    remaining = message.retry_attempts - 1,
                    "delivery failed, scheduling retry"
                );
                dal.mark_retryable(message).await
            }
            Transition::Fail(detail) => {
                error!(id = %message.id, detail = %detail, "delivery failed permanently");
                dal.mark_failed(message, &detail).await
            }
        }
    }
}
