// Core infrastructure modules
pub mod core;

// Application modules
pub mod config;
pub mod demo;
pub mod posts;
