//! Terrain surface operations
//!
//! - Gaussian smoothing: separable, nodata-aware, exact on flat ground

mod gaussian;

pub use gaussian::{gaussian_kernel, gaussian_smooth, GaussianParams};
