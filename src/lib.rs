// src/lib.rs

//! betterread core library

pub mod cache;
pub mod error;
pub mod limiter;
pub mod models;
pub mod pipeline;
pub mod services;
