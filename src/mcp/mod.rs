//! MCP Server for property valuation
//!
//! Exposes filter extraction, fair price estimation and index status as
//! MCP tools over stdio.

mod server;

pub use server::run_mcp_server;
