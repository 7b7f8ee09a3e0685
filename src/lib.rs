// Library for tests to access modules

pub mod app;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod definitions;
pub mod error;
pub mod export;
pub mod layout;
pub mod models;
pub mod pivot;
pub mod runner;
pub mod selector;
pub mod sites;
pub mod version;
