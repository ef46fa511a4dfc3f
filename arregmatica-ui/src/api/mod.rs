//! API Client
//!
//! HTTP client functions for the Arregmatica REST API.

pub mod client;

pub use client::*;
