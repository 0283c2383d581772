//! Image geometry: how big, and which CDN transform.
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing a CDN transform
//! - **Resolver**: The decision sequence turning partial signals into a
//!   [`ResolvedGeometry`]

mod calculations;
mod params;
mod resolver;

pub use calculations::{
    constrain_dimensions, crop_dimensions, is_smaller, proportional_height, round_dimension,
};
pub(crate) use params::encode_value;
pub use params::{Dimension, ResolvedGeometry, Transform, TransformArgs};
pub use resolver::{Signals, resolve};
