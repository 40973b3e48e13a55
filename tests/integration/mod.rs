//! Integration tests for xslt_callout
//!
//! Callouts run against a toy engine (see `helpers`) so pool, cache and
//! error handling can be checked without a real XSLT implementation.
//! Run with: cargo test --test integration


mod concurrency;
mod end_to_end;
#[cfg(feature = "url-loader")]
mod url_resources;
