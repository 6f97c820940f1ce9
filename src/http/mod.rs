//! HTTP protocol layer module
//!
//! Range parsing, cache header helpers and response builders, decoupled from
//! application and media logic.

pub mod cache;
pub mod range;
pub mod response;

pub use range::{parse_range_header, ByteRange, RangeParseResult};
pub use response::{
    build_400_response, build_403_response, build_404_response, build_405_response,
    build_416_response, build_options_response, build_redirect_response,
};
