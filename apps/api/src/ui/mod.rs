//! Server-rendered HTML pages for browser users.

pub mod handlers;
pub mod views;
