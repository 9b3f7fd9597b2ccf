//! Campaign content generation backend
//!
//! The core of this crate is the batch orchestrator in
//! [`services::orchestrator`]: it generates a caption and an image for every
//! post of a batch with bounded parallelism, records each post's progress, and
//! settles the batch with a report that accounts for every post exactly once.

pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;
