// src/handlers/mod.rs

pub mod admin;
pub mod exercises;
pub mod progress;
