//! Core components: alignment scoring and compute backend selection.

pub mod alignment;
pub mod compute;
