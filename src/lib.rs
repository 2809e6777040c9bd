//! Produce catalog library
//!
//! A coalescing TTL cache for category documents plus the seasonal
//! classifier and search engine that run over the cached products.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod search;
pub mod seasons;
