//! Digest functions and random hash generation built on [`Hash`](crate::types::hash::Hash).

pub mod digest;
pub mod random;
