//! polyhost - multi-application HTTP server
//!
//! Multiplexes several independent applications behind one HTTP entry point
//! by hostname. Each application declares its hostnames (wildcards allowed),
//! a base URI, a route table with parameterized patterns, and a media tree;
//! the server resolves the application for each request, serves static media
//! with conditional-GET and byte-range support, and dispatches everything
//! else to the application's registered handlers.

pub mod app;
pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod media;
pub mod routing;
pub mod server;
