//! Song request backend for DJ events.

pub mod api;
pub mod crypto;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod models;
