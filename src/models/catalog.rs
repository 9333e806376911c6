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

//! Catalog payload DTOs.
//!
//! These are the serializable snapshots domain-write handlers hand to the
//! [`OutboxWriter`](crate::writer::OutboxWriter). The relay itself treats
//! payloads as opaque JSON; these types exist so callers and tests share
//! one vocabulary with the downstream search service. Deletion events carry
//! only the entity id.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Option<i32>,
    pub title: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: Option<i32>,
    pub title: String,
    pub image: Option<String>,
    pub category_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductType {
    pub id: Option<i32>,
    pub title: String,
    pub image: Option<String>,
    pub subcategory_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Option<i32>,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub in_stock: bool,
    pub category_id: i32,
    pub subcategory_id: i32,
    pub product_type_id: i32,
}

/// A single attribute value attached to a product (e.g. "color" = "red").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAttributeValue {
    pub id: Option<i32>,
    pub value: String,
    pub attribute_id: i32,
    pub product_id: i32,
}
