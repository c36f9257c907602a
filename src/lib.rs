pub mod catalog;
pub mod charts;
pub mod config;
pub mod conversions;
pub mod db;
pub mod extract;
pub mod fetch_error;
pub mod fetcher;
pub mod observation;
pub mod services;
