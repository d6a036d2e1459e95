// SPDX-License-Identifier: MIT

//! Trainlink: activity upload ingestion and plan matching
//!
//! This crate provides the backend API that ingests fitness-tracker
//! exports (binary FIT, XML TCX), normalizes them into completed
//! activities, and links them to previously planned training sessions
//! using a confidence-scored matching engine.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod parsers;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
}
