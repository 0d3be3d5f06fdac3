//! Interactive terminal client for a Model Context Protocol server.
//!
//! The client launches one MCP server as a child process, lets the operator
//! browse and invoke its tools, resources, resource templates and prompts,
//! and relays prompts through an LLM. Model output that describes a user is
//! turned into a [`extract::UserRecord`] and persisted through the server's
//! `create-user` tool and local record files.
//!
//! # Architecture
//!
//! - **MCP**: rmcp child-process session behind the `CapabilityService` trait,
//!   plus a catalog snapshot taken at connect time
//! - **LLM**: OpenAI-compatible Chat Completions driver with a tool loop
//! - **Dispatch**: menu-driven loop over a [`session::Session`] context
//!
//! # Modules
//!
//! - [`config`]: CLI and layered configuration
//! - [`dispatch`]: Main menu loop and flows
//! - [`extract`]: User-record extraction from model output
//! - [`llm`]: LLM driver traits and implementations
//! - [`mcp`]: MCP client, catalog and sampling handler
//! - [`normalized`]: Unified streaming event model
//! - [`operator`]: Terminal interaction
//! - [`records`]: Latest-output file and user-record log
//! - [`relay`]: Prompt relay and the user-capture pipeline

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::assigning_clones)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::default_trait_access)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod llm;
pub mod mcp;
pub mod normalized;
pub mod operator;
pub mod records;
pub mod relay;
pub mod session;
pub mod telemetry;
