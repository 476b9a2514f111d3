//! Fraud Detection Console
//!
//! Client-side core of the document fraud-detection platform: an authenticated
//! REST adapter, session handling against the hosted identity provider, the
//! prompt/configuration/document managers and the agent verification workflow
//! that polls a job until it finishes.

pub mod app_state;
pub mod config;
pub mod controllers;
pub mod models;
pub mod services;
pub mod shell;
