pub mod config;
pub mod console;
pub mod context;
pub mod db;
pub mod model;
pub mod schema;
pub mod web;
