pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod pose;
pub mod posture;
pub mod protocol;
pub mod render;
