//! Model Context Protocol (MCP) client implementation.
//!
//! The client launches one MCP server as a child process and talks to it
//! over stdio. Everything above this module sees the server through the
//! [`service::CapabilityService`] trait and the [`catalog::Catalog`]
//! snapshot taken at connect time.
//!
//! # Configuration
//!
//! The server is configured under the `server` key:
//!
//! ```yaml
//! server:
//!   command: node
//!   args: ["build/server.js"]
//!   env:
//!     DATA_DIR: "${HOME}/users"
//! ```

pub mod catalog;
pub mod client;
pub mod config;
pub mod sampling;
pub mod service;
pub mod types;
