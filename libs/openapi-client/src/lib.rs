//! Wire models for the deployment orchestrator HTTP API.

pub mod models;
