//! # Middleware
//!
//! Tower/Axum middleware applied to the `/v1` API surface.
//!
//! - [`metrics`]: HTTP request counters and latency histograms.

pub mod metrics;
