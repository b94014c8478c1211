//! Web UI and JSON API.

mod server;
pub mod templates;

pub use server::{ServerHandle, WebState, build_router, html_escape, render_index, start_server};
