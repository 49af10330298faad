pub mod export;
pub mod filters;
pub mod handlers;
pub mod profile;
pub mod queries;
