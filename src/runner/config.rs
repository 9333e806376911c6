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

//! Configuration for the relay runner.

use std::time::Duration;

use crate::models::outbox_message::DEFAULT_RETRY_BUDGET;

/// Configuration for the relay runner.
///
/// # Construction
///
/// Use [`RelayConfig::builder()`]:
///
/// ```rust,ignore
/// let config = RelayConfig::builder()
///     .poll_interval(Duration::from_secs(300))
///     .publish_timeout(Duration::from_secs(10))
///     .build();
/// ```
///
/// Or use the defaults with `RelayConfig::default()`.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct RelayConfig {
    poll_interval: Duration,
    publish_timeout: Duration,
    retry_budget: i32,
    breaker_failure_threshold: u32,
    breaker_cooldown: Duration,
    db_pool_size: u32,
}

impl RelayConfig {
    /// Creates a new configuration builder with default values.
    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder::default()
    }

    /// How often the scheduler runs a delivery pass.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Maximum time allowed for a single publish call.
    pub fn publish_timeout(&self) -> Duration {
        self.publish_timeout
    }

    /// Initial retry budget assigned to new outbox messages.
    pub fn retry_budget(&self) -> i32 {
        self.retry_budget
    }

    /// Consecutive transient failures that open the circuit breaker.
    pub fn breaker_failure_threshold(&self) -> u32 {
        self.breaker_failure_threshold
    }

    /// How long the circuit breaker stays open before probing recovery.
    pub fn breaker_cooldown(&self) -> Duration {
        self.breaker_cooldown
    }

    /// Number of database connections in the pool.
    pub fn db_pool_size(&self) -> u32 {
        self.db_pool_size
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfigBuilder::default().build()
    }
}

/// Builder for [`RelayConfig`].
#[derive(Debug, Clone)]
pub struct RelayConfigBuilder {
    config: RelayConfig,
}

impl Default for RelayConfigBuilder {
    fn default() -> Self {
        Self {
            config: RelayConfig {
                // One pass per hour, matching the downstream indexer's
                // ingestion cadence.
                poll_interval: Duration::from_millis(3_600_000),
                publish_timeout: Duration::from_secs(30),
                retry_budget: DEFAULT_RETRY_BUDGET,
                breaker_failure_threshold: 5,
                breaker_cooldown: Duration::from_secs(60),
                db_pool_size: 10,
            },
        }
    }
}

impl RelayConfigBuilder {
    /// Sets the delivery pass interval.
    pub fn poll_interval(mut self, value: Duration) -> Self {
        self.config.poll_interval = value;
        self
    }

    /// Sets the publish call timeout.
    pub fn publish_timeout(mut self, value: Duration) -> Self {
        self.config.publish_timeout = value;
        self
    }

    /// Sets the initial retry budget for new messages.
    pub fn retry_budget(mut self, value: i32) -> Self {
        self.config.retry_budget = value;
        self
    }

    /// Sets the breaker's consecutive-failure threshold.
    pub fn breaker_failure_threshold(mut self, value: u32) -> Self {
        self.config.breaker_failure_threshold = value;
        self
    }

    /// Sets the breaker's cooldown period.
    pub fn breaker_cooldown(mut self, value: Duration) -> Self {
        self.config.breaker_cooldown = value;
        self
    }

    /// Sets the database pool size.
    pub fn db_pool_size(mut self, value: u32) -> Self {
        self.config.db_pool_size = value;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> RelayConfig {
        self.config
    }
}
