//! Utility types and functions for formwork.
//!
//! This module provides:
//! - [`MultiValueDict`]: An insertion-ordered dictionary with multiple values per key.
//! - [`text`]: String utility functions (labels, HTML escaping).

mod multi_value_dict;
pub mod text;

pub use multi_value_dict::MultiValueDict;
