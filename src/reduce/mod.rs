//! Dimensionality reduction for the employee map.
//!
//! Projection is independent of clustering: the same embedding can be shown
//! with labels from either clustering strategy.

mod umap;

pub use umap::{Embedding2D, Umap};
