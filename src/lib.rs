//! Nyanime Backend Library
//!
//! JWT session core plus the anime review REST API built on it.
//! The `nyanime` binary wires these together; tests drive the router directly.

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod middleware;
