pub mod config;
pub mod debug;
pub mod fetcher;
pub mod models;
pub mod parser;
pub mod s3;
pub mod segments;
pub mod stats;
pub mod storage;
pub mod tui;
