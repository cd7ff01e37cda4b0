//! Recorded captures drive the same pipeline as a live link

mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use common::{AB01, CD02, Collector, chunk, complete, init_tracing, within};
use futures::StreamExt;
use glasslink::capture::{CaptureReader, CaptureWriter};
use glasslink::{Glasslink, LinkError, ReplaySource, SessionConfig, SessionStats};

fn capture_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("glasslink-{}-{}.glcap", name, std::process::id()))
}

fn record(path: &PathBuf, frames: &[Vec<u8>]) {
    let mut writer = CaptureWriter::create(path).unwrap();
    for frame in frames {
        writer.write_frame(frame).unwrap();
    }
    writer.finish().unwrap();
}

fn session_frames() -> Vec<Vec<u8>> {
    vec![
        chunk(0, AB01, &[1, 2]),
        chunk(0, CD02, &[9]),
        vec![0xde, 0xad],
        chunk(1, AB01, &[3, 4]),
        complete(AB01),
        complete(CD02),
    ]
}

#[tokio::test]
async fn replayed_capture_produces_the_recorded_photos() {
    init_tracing();
    let path = capture_path("replay");
    record(&path, &session_frames());

    let collector = Arc::new(Collector::default());
    let session =
        Glasslink::replay(&path, Arc::clone(&collector), &SessionConfig::default()).unwrap();

    within(session.wait_ended()).await;
    within(session.scheduler().wait_idle()).await;

    let photos: Vec<Vec<u8>> = collector.batches().into_iter().flatten().collect();
    assert_eq!(photos, vec![vec![1, 2, 3, 4], vec![9]]);

    let stats = session.stats();
    assert_eq!(stats.frames_received, 6);
    assert_eq!(stats.malformed_frames, 1);

    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn paced_replay_reports_stats_at_configured_rate() {
    let path = capture_path("paced");
    record(&path, &session_frames());

    let config =
        SessionConfig::from_yaml_str("replay_frame_interval_ms: 5\nstats_rate: !Max 50\n")
            .unwrap();
    let session = Glasslink::replay(&path, Arc::new(Collector::default()), &config).unwrap();
    let updates = session.stats_stream();

    let started = tokio::time::Instant::now();
    let seen: Vec<SessionStats> = within(updates.collect()).await;
    assert!(started.elapsed() >= Duration::from_millis(20));

    let last = seen.last().unwrap();
    assert!(last.ended);
    assert_eq!(last.transfers_completed, 2);

    std::fs::remove_file(&path).ok();
}

#[test]
fn corrupted_capture_is_rejected_before_a_session_starts() {
    let path = capture_path("corrupt");
    record(&path, &[chunk(0, AB01, &[1, 2, 3])]);

    let mut bytes = std::fs::read(&path).unwrap();
    bytes.truncate(bytes.len() - 1);
    std::fs::write(&path, &bytes).unwrap();

    match ReplaySource::open(&path) {
        Err(LinkError::Capture { details, .. }) => assert!(details.contains("byte 6")),
        other => panic!("expected capture error, got {:?}", other.map(|_| ())),
    }
    assert!(CaptureReader::open(&path).is_err());

    std::fs::remove_file(&path).ok();
}

#[test]
fn missing_capture_is_a_file_error() {
    let err = ReplaySource::open(capture_path("missing")).unwrap_err();
    assert!(matches!(err, LinkError::File { .. }));
    assert!(!err.recovery_suggestions().is_empty());
}
