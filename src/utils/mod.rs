//! Utility functions and helpers.

pub mod tabular;

pub use tabular::{Dataset, Format, Record};
