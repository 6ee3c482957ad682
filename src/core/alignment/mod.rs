//! Alignment scoring kernels and the buffers they run on.

pub mod banded_swa;
pub mod shared_types; // Lane-major grids shared by the loader and kernels
pub mod workspace; // Thread-local buffer pools for allocation reuse
