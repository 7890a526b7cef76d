//! A small file-backed property-graph store with a Cypher-like pattern-matching
//! core.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  dota-graph                       │
//! ├──────────────────────────────────────────────────┤
//! │  ┌────────────────────────────────┐               │
//! │  │  Request dispatcher (dispatch) │               │
//! │  └────────────┬───────────────────┘               │
//! │               ↓                                    │
//! │  ┌────────────────────────────────┐               │
//! │  │  Pattern + match iterator       │               │
//! │  └────────────┬───────────────────┘               │
//! │               ↓                                    │
//! │  ┌────────────────────────────────┐               │
//! │  │  Storage engine (offset file)  │               │
//! │  └────────────────────────────────┘               │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `storage`: offset-addressed file storage engine and binary codec
//! - `pattern`: MATCH pattern construction and the match iterator
//! - `where_expr`: the WHERE boolean filter
//! - `dispatch`: the five request operators (CREATE/SET/REMOVE/DELETE/RETURN)

pub mod dispatch;
pub mod pattern;
pub mod storage;
pub mod where_expr;

pub use dispatch::{dispatch, DispatchError, Request, Response};
pub use pattern::{MatchIterator, Pattern, PatternError};
pub use storage::{Storage, StorageError, StorageResult};
pub use where_expr::WhereExpr;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
