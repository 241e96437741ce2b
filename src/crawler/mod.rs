//! # Crawler Module
//!
//! Implements the engine that executes a [`RunPlan`](crate::plan::RunPlan).
//!
//! ## Key Components
//!
//! - **Crawler**: owns the run, dispatches queued requests and reports the
//!   final result
//! - **Request handler**: the per-request path from downloader middleware to
//!   follow-up scheduling
//! - **Item processor**: the per-item path through response middleware and
//!   item processors
//! - **Middleware chain**: ordered traversal of every chain

mod context;
mod core;
mod item_processor;
mod middleware_chain;
mod request_handler;

pub use self::core::Crawler;
