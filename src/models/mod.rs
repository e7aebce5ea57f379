// src/models/mod.rs

pub mod assessment;
pub mod cognitive;
pub mod interaction;
pub mod question;
pub mod user;
