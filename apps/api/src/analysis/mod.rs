// Matching and scoring engine.
// dictionary → extractor/matcher → scoring → recommendations, orchestrated by batch.
// Everything below handlers is synchronous and free of I/O.

pub mod batch;
pub mod dictionary;
pub mod extractor;
pub mod handlers;
pub mod matcher;
pub mod recommendations;
pub mod scoring;
