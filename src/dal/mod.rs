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

//! Data Access Layer with runtime backend selection.
//!
//! The [`DAL`] struct is the single entry point for database operations.
//! Each operation dispatches to the PostgreSQL or SQLite implementation
//! based on the connection the [`Database`] was built from.

use crate::database::{AnyPool, BackendType, Database};

pub mod models;
mod outbox_message;

pub use outbox_message::OutboxMessageDAL;
#[cfg(feature = "postgres")]
pub(crate) use outbox_message::insert_postgres;
#[cfg(feature = "sqlite")]
pub(crate) use outbox_message::insert_sqlite;

/// The Data Access Layer struct.
///
/// `DAL` is `Clone`; each clone references the same underlying connection
/// pool.
#[derive(Clone, Debug)]
pub struct DAL {
    /// The database instance with connection pool
    pub database: Database,
}

impl DAL {
    /// Creates a new DAL instance.
    pub fn new(database: Database) -> Self {
        DAL { database }
    }

    /// Returns the backend type for this DAL instance.
    pub fn backend(&self) -> BackendType {
        self.database.backend()
    }

    /// Returns a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Returns the connection pool.
    pub fn pool(&self) -> AnyPool {
        self.database.pool()
    }

    /// Returns an outbox message DAL for record operations.
    pub fn outbox_message(&self) -> OutboxMessageDAL {
        OutboxMessageDAL::new(self)
    }
}
