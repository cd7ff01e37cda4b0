//! Replay source for frame captures

use std::path::Path;
use tokio::time::{Duration, Interval, MissedTickBehavior, interval};
use tracing::{debug, info, trace};

use crate::capture::CaptureReader;
use crate::source::FrameSource;
use crate::Result;

/// Frame source that replays a recorded capture
#[derive(Debug)]
pub struct ReplaySource {
    /// Capture reader
    reader: CaptureReader,

    /// Frame pacing; `None` replays as fast as the session consumes
    interval: Option<Interval>,
}

impl ReplaySource {
    /// Open a capture file for replay
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = CaptureReader::open(path)?;
        info!(
            "Opened capture {}: {} frames",
            reader.path().display(),
            reader.total_frames()
        );
        Ok(Self::from_reader(reader))
    }

    /// Replay an already loaded capture
    pub fn from_reader(reader: CaptureReader) -> Self {
        Self { reader, interval: None }
    }

    /// Pace frames `frame_interval` apart, or replay unpaced with `None`.
    ///
    /// Must be called within a Tokio runtime when pacing is enabled.
    pub fn with_frame_interval(mut self, frame_interval: Option<Duration>) -> Self {
        self.interval = frame_interval.filter(|d| !d.is_zero()).map(|d| {
            let mut interval = interval(d);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        debug!("Replay pacing set to {:?}", frame_interval);
        self
    }

    /// Frames replayed so far
    pub fn frames_replayed(&self) -> usize {
        self.reader.current_frame()
    }

    /// Total frames in the capture
    pub fn total_frames(&self) -> usize {
        self.reader.total_frames()
    }
}

#[async_trait::async_trait]
impl FrameSource for ReplaySource {
    async fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        if self.reader.current_frame() >= self.reader.total_frames() {
            debug!("Reached end of capture");
            return Ok(None);
        }

        if let Some(interval) = &mut self.interval {
            interval.tick().await;
        }

        let total = self.reader.total_frames();
        let frame = match self.reader.read_next_frame() {
            Some(frame) => frame.to_vec(),
            None => return Ok(None),
        };

        trace!("Frame {}/{}: {} bytes", self.reader.current_frame(), total, frame.len());
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureWriter;

    fn reader(frames: &[&[u8]]) -> CaptureReader {
        let mut writer = CaptureWriter::new(Vec::new()).unwrap();
        for frame in frames {
            writer.write_frame(frame).unwrap();
        }
        CaptureReader::from_bytes(&writer.finish().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn replays_every_frame_then_ends() {
        let mut source = ReplaySource::from_reader(reader(&[&[1], &[2, 2]]));

        assert_eq!(source.next_frame().await.unwrap(), Some(vec![1]));
        assert_eq!(source.next_frame().await.unwrap(), Some(vec![2, 2]));
        assert_eq!(source.next_frame().await.unwrap(), None);
        assert_eq!(source.frames_replayed(), source.total_frames());
    }

    #[tokio::test]
    async fn paced_replay_spaces_frames() {
        let mut source = ReplaySource::from_reader(reader(&[&[1], &[2], &[3]]))
            .with_frame_interval(Some(Duration::from_millis(10)));

        let start = tokio::time::Instant::now();
        while source.next_frame().await.unwrap().is_some() {}

        // First tick completes immediately, the other two wait
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
