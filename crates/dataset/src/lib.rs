//! Synthetic Alert Dataset
//!
//! Label sets are streamed from a text exposition file and cached as they
//! are first requested, so large datasets never have to be loaded up front.

mod dataset;
mod error;
pub mod exposition;

pub use dataset::Dataset;
pub use error::{DatasetError, ParseError, ParseErrorKind};
