pub mod skeleton;

pub use skeleton::{build_overlay, OverlayPoint, OverlaySegment, SkeletonOverlay, POSE_CONNECTIONS};
