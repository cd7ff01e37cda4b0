//! Frame source implementations

pub mod channel;
pub mod replay;

pub use channel::{ChannelSource, FramePusher};
pub use replay::ReplaySource;
