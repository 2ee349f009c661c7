pub mod loader;
pub mod pipeline;
pub mod transforms;

pub use loader::ImageLoader;
pub use pipeline::{build_transform, build_transform_for, Phase, Pipeline, TransformStep};
pub use transforms::ImageTransforms;
