//! Shared "who brings what" menu.
//!
//! [`persistence::MenuStore`] keeps the menu in a JSON file and serializes
//! every read and write behind one lock.
//! [`services::broadcast_service::Broadcaster`] fans each post-mutation
//! snapshot out to live stream subscribers without ever blocking the writer.

pub mod app;
pub mod config;
pub mod errors;
pub mod persistence;
pub mod routes;
pub mod services;
pub mod state;
