//! Quire Kernel Library
//!
//! Multi-tenant blog content API: blog posts, tenant sites and the access
//! rules between them. The main entry point for running the server is the
//! `quire` binary.

pub mod access;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
