pub mod apperror;
pub mod catalog;
pub mod config;
pub mod models;
