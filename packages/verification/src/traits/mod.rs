//! Core trait abstractions for the verification pipeline.
//!
//! These traits define the seams to external collaborators: search
//! providers, HTTP fetching, embedding models, persistence, explanation
//! generation, and rate pacing.

pub mod embedder;
pub mod explainer;
pub mod fetcher;
pub mod pacer;
pub mod searcher;
pub mod store;
