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

//! Test fixtures: per-test SQLite databases and scripted publish clients.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use tempfile::TempDir;

use catalog_relay::{
    Database, MessageType, OutboxMessage, PublishClient, PublishError, PublishOutcome, DAL,
};

static INIT: Once = Once::new();

/// A fresh SQLite database with migrations applied.
///
/// The temp directory lives as long as the harness; dropping the harness
/// deletes the database.
pub struct TestHarness {
    _dir: TempDir,
    pub path: String,
    pub database: Database,
    pub dal: DAL,
}

pub async fn harness() -> TestHarness {
    INIT.call_once(|| catalog_relay::init_logging(Some("warn")));

    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir
        .path()
        .join("relay.db")
        .to_str()
        .expect("temp path is not utf-8")
        .to_string();

    let database = Database::new(&path, 1);
    database
        .run_migrations()
        .await
        .expect("failed to run migrations");
    let dal = DAL::new(database.clone());

    TestHarness {
        _dir: dir,
        path,
        database,
        dal,
    }
}

/// A publish client that replays a scripted sequence of outcomes.
///
/// Once the script is exhausted, further calls resolve to `Published`.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<PublishOutcome, PublishError>>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new(script: Vec<Result<PublishOutcome, PublishError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PublishClient for ScriptedClient {
    async fn send(&self, _message: &OutboxMessage) -> Result<PublishOutcome, PublishError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(Ok(PublishOutcome::Published))
    }
}

/// A publish client that rejects one message type and accepts the rest.
///
/// Keyed on message type rather than call order so batch tests don't
/// depend on scan ordering.
pub struct RejectingClient {
    reject: MessageType,
    calls: AtomicUsize,
}

impl RejectingClient {
    pub fn new(reject: MessageType) -> Arc<Self> {
        Arc::new(Self {
            reject,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PublishClient for RejectingClient {
    async fn send(&self, message: &OutboxMessage) -> Result<PublishOutcome, PublishError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if message.message_type == self.reject {
            Err(PublishError::ClientRejected("invalid payload".to_string()))
        } else {
            Ok(PublishOutcome::Published)
        }
    }
}
