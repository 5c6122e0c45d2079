// feedback-core: moderated feedback endpoint.
//
// This is the library root. A submission flows web → pipeline (toxicity,
// spam) → backend, and every failure comes back through the same envelope.

pub mod backend;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod spam;
pub mod toxicity;
pub mod web;
