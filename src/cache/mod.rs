//! In-memory catalog cache with request coalescing
//!
//! This module provides `ProductCache`, which serves category documents,
//! the all-categories aggregate and product lookups with a time-to-live.
//! Concurrent requests for the same key share a single fetch: the first
//! caller starts it and everyone else awaits the same shared future.

mod manager;

pub use manager::{
    category_key, product_key, CatalogError, ProductCache, ALL_CATEGORIES_KEY, DEFAULT_TTL,
};
