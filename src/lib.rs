//! Terminal photo album manager.
//!
//! Albums live in a small capacity-limited key-value store and fall back to
//! a SQLite record store when they outgrow it.

pub mod album;
pub mod app;
pub mod config;
pub mod data_url;
pub mod download;
pub mod ingest;
pub mod logging;
pub mod notify;
pub mod order;
pub mod storage;
pub mod store;
pub mod tasks;
pub mod ui;
pub mod view;
