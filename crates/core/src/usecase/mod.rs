pub mod chunk_summarizer;
pub mod export;
pub mod ingest;
pub mod job_runner;
pub mod job_store;
pub mod library;
pub mod pipeline;
pub mod status;
pub mod translation;
pub mod trial;
