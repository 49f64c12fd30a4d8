pub mod api;
pub mod auth;
pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod managers;
pub mod resource;
pub mod session;
pub mod store;

#[cfg(test)]
pub mod testing;
