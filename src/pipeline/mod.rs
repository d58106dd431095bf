pub mod controller;
pub mod controls;
pub mod queue;
pub mod sink;

pub use controller::{FrameOutcome, FramePipeline};
pub use controls::SessionControls;
pub use queue::{frame_channel, FrameSender};
pub use sink::{
    CommandSpeech, NotificationSink, NullSink, Sinks, SpeechSink, StatusLabel, UiEvent, UiSink,
};
