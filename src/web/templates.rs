//! HTML templates for the web UI.
//!
//! Templates are embedded at compile time using `include_str!`.

/// The index page. `{{TASK_ITEMS}}` receives the server-rendered list and
/// `{{INITIAL_TASKS}}` the same tasks as JSON for the page script.
pub const INDEX_TEMPLATE: &str = include_str!("templates/index.html");
