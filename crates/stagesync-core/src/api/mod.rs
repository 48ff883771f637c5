//! HTTP transport module for the document mirrors.
//!
//! This module provides the `HttpTransport` seam and its reqwest-backed
//! `FetchClient`, plus the `SyncError` taxonomy shared by the whole crate.

pub mod client;
pub mod error;

pub use client::{FetchClient, FetchResponse, HttpTransport};
pub use error::SyncError;
