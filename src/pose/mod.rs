pub mod estimator;
pub mod landmark;

pub use estimator::{EstimatorOptions, LandmarkFrame, ModelComplexity, PoseEstimator, RemoteEstimator};
pub use landmark::{LandmarkIndex, LandmarkPoint, LandmarkSnapshot};
