//! MCP (Model Context Protocol) server for intent-router.
//!
//! Exposes the routing workflow as MCP tools so external agents can hand
//! a user message to the router and get the synthesized reply back.
//!
//! # Feature Gate
//!
//! This module requires the `mcp` feature flag:
//! ```toml
//! [dependencies]
//! intent-router = { version = "...", features = ["mcp"] }
//! ```
//!
//! # Architecture
//!
//! ```text
//! MCP Client
//!   ↓ route(message, session_id)
//! RouterMcpServer
//!   ↓
//! Workflow::invoke()
//!   ├── classify
//!   ├── agent_a | agent_b | fallback
//!   └── finalize
//!   ↓
//! reply JSON → MCP Client
//! ```

pub mod params;
pub mod server;
pub mod transport;

pub use params::{ClassifyParams, RouteParams};
pub use server::RouterMcpServer;
pub use transport::{serve_sse, serve_stdio};
