pub mod auth;
pub mod models;
pub mod storage;
pub mod stt;
pub mod summarizer;
pub mod translate;
