pub mod api;
pub mod cli;
pub mod config;
pub mod download;
pub mod edit;
pub mod error;
pub mod preview;
pub mod rules;
pub mod scanner;
pub mod session;
pub mod view;
pub mod workflow;
