//! infer-relay: HTTP relay in front of a KServe v2 inference endpoint.
//!
//! Accepts a question/context pair, renders it as a ChatML prompt, forwards
//! it to the currently selected model at `{base_url}/{model}/infer`, and
//! returns the answer with any `<think>` reasoning removed.

pub mod alert;
pub mod config;
pub mod metrics;
pub mod relay;
pub mod server;
