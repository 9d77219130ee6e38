//! Relaypost - LinkedIn content automation backend
//!
//! This library provides the core functionality for the relaypost server:
//! post persistence, content-generation sessions driven by n8n workflows,
//! LinkedIn OAuth credential storage, and the HTTP API over all of it.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod webhook;
