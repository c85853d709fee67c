//! Common utilities for integration tests

pub mod helpers;
pub mod models;

// Re-export commonly used items
pub use helpers::{
    assert_fields_close,
    build,
    field_sum,
    relative_error,
    very_simple_rhs,
};
pub use models::{
    empty_membrane_model,
    mixed_spatial_model,
    separated_cells,
    stiff_pixel_model,
};
