//! Task list library
//!
//! This module exports the core components for testing and integration.

pub mod cache;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod types;
pub mod view;
pub mod web;
