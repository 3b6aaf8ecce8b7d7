// src/models/mod.rs

pub mod exercise;
pub mod progress;
