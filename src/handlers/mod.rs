// src/handlers/mod.rs

pub mod assessment;
pub mod auth;
pub mod metrics;
pub mod profile;
pub mod results;
