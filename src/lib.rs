//! # Kip
//!
//! A local sleep diary with derived statistics and AI-generated advice.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (users, sleep records, stat views)
//! - **calculate**: Duration and recent-window arithmetic
//! - **storage**: Embedded SQLite database behind a worker thread
//! - **service**: Domain rules (uniqueness, recompute, aggregation)
//! - **advice**: Narrative advice via a pluggable AI backend
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod advice;
pub mod api;
pub mod calculate;
pub mod config;
pub mod models;
pub mod service;
pub mod storage;

pub use models::*;
