//! Configuration, payload models and secret lookup shared by both handlers

pub mod config;
pub mod models;
pub mod secrets;
