mod attribute;
mod bounding_box;
mod color;
mod dense_buffer;
mod error;
mod grid_sampler;
mod params;
mod point_cloud;
mod render;
mod simp_params;

pub mod prelude {
    pub use crate::attribute::*;
    pub use crate::bounding_box::*;
    pub use crate::color::*;
    pub use crate::dense_buffer::*;
    pub use crate::error::*;
    pub use crate::grid_sampler::*;
    pub use crate::params::*;
    pub use crate::point_cloud::*;
    pub use crate::render::*;
    pub use crate::simp_params::*;
}
