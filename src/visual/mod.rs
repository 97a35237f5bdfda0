//! Visual regression pipeline: persist, crop, perceptual diff

pub mod compare;
pub mod pipeline;
pub mod region;

pub use compare::ComparisonResult;
pub use region::CropRegion;
