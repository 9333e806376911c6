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

//! Integration tests for the outbox relay pipeline.
//!
//! Each test gets its own throwaway SQLite database; delivery outcomes are
//! scripted through mock publish clients so the full write -> schedule ->
//! transition path runs without a live downstream service.

mod fixtures;
mod pipeline;
mod transitions;
mod writer;
