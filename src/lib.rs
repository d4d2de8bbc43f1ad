//! Clip Saver client: CRUD calls against the clip REST API and a local export
//! pipeline producing JSON, CSV and paginated PDF files.

pub mod api;
pub mod config;
pub mod export;
pub mod model;
