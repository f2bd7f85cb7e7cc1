pub mod api;
pub mod chain;
pub mod classifier;
pub mod config;
pub mod dialog;
pub mod error;
pub mod explorer;
pub mod feedback;
pub mod models;
pub mod net;
pub mod service;
