pub mod config;
pub mod crud;
pub mod get;
pub mod joins;
pub mod transaction;
