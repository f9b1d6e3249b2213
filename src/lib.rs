pub mod app;
pub mod config;
pub mod controller;
pub mod core;
pub mod cursor;
pub mod error;
pub mod ingest;
pub mod media;
pub mod model;
pub mod playlist;
pub mod store;
pub mod ui;
pub mod upload;
