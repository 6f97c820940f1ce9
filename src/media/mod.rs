//! Media serving module
//!
//! Serves static assets resolved across the active application's media tree,
//! the global asset directory and installed package assets, with
//! conditional-GET and byte-range support. Requests without a recognized
//! file extension are not handled here and fall through to routing.

pub mod category;
pub mod serve;

pub use category::{category_for, mime_type};
pub use serve::{serve, MediaError, MediaOutcome, MediaRequest};
