pub mod catalog;
pub mod comparison;
pub mod config;
pub mod optimizer;
pub mod output;
pub mod server;
