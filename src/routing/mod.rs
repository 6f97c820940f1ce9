//! Request routing module
//!
//! Route patterns, the per-application route table, path matching and the
//! reverse rewriting of internal links back to routed URLs.

pub mod matcher;
pub mod pattern;
pub mod rewrite;
pub mod table;

pub use matcher::{match_route, RouteError, RouteMatch};
pub use pattern::{RoutePattern, Segment};
pub use table::RouteTable;
