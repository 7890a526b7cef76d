//! The TCP front end: frames requests/responses over a socket and drives
//! `dota_graph::dispatch` against one open storage file.

pub mod config;
pub mod error;
pub mod net;

pub use config::Config;
pub use error::ServerError;
