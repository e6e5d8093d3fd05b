pub mod app;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod idmap;
pub mod loaders;
pub mod mat;
pub mod output;
pub mod store;
pub mod table;
