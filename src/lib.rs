pub mod auth;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
