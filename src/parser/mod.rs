//! Loaders for grammar files.

pub(crate) mod json;
