pub mod api_connection;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod nutrition;
pub mod pantry;
pub mod quantity;
pub mod ranking;
pub mod recipe_aggregator;
pub mod recipe_detail;
pub mod sources;
pub mod unit_converter;
