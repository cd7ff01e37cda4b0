//! End-to-end behavior of a push-fed photo session

mod common;

use std::sync::Arc;

use common::{AB01, CD02, Collector, chunk, complete, init_tracing, within};
use futures::StreamExt;
use glasslink::{
    BlobSink, BoxError, CoalescedScheduler, Glasslink, PassOutcome, PhotoSession, SessionConfig,
    TransferMultiplexer,
};

#[tokio::test]
async fn single_transfer_reaches_consumer() {
    init_tracing();
    let collector = Arc::new(Collector::default());
    let (pusher, session) = Glasslink::channel(Arc::clone(&collector), &SessionConfig::default());

    pusher.push(chunk(0, AB01, &[1, 2])).await.unwrap();
    pusher.push(chunk(1, AB01, &[3, 4])).await.unwrap();
    pusher.push(complete(AB01)).await.unwrap();
    drop(pusher);

    within(session.wait_ended()).await;
    within(session.scheduler().wait_idle()).await;

    assert_eq!(session.photo_count(), 1);
    assert_eq!(collector.batches(), vec![vec![vec![1, 2, 3, 4]]]);
    assert_eq!(session.scheduler().cursor(), 1);
}

#[tokio::test]
async fn interleaved_transfers_seal_independently() {
    init_tracing();
    let collector = Arc::new(Collector::default());
    let (pusher, session) = Glasslink::channel(Arc::clone(&collector), &SessionConfig::default());

    for frame in [
        chunk(1, AB01, &[3]),
        chunk(0, CD02, &[10]),
        chunk(0, AB01, &[1, 2]),
        chunk(1, CD02, &[11]),
        complete(CD02),
        complete(AB01),
    ] {
        pusher.push(frame).await.unwrap();
    }
    drop(pusher);

    within(session.wait_ended()).await;

    // Completion order, not start order
    let photos: Vec<Vec<u8>> = session.photos_snapshot().iter().map(|p| p.to_vec()).collect();
    assert_eq!(photos, vec![vec![10, 11], vec![1, 2, 3]]);

    within(session.scheduler().wait_idle()).await;
    let delivered: Vec<Vec<u8>> = collector.batches().into_iter().flatten().collect();
    assert_eq!(delivered, photos);
}

#[tokio::test]
async fn malformed_and_stray_frames_are_counted_not_fatal() {
    init_tracing();
    let (pusher, session) =
        Glasslink::channel(Arc::new(Collector::default()), &SessionConfig::default());

    pusher.push(Vec::new()).await.unwrap();
    pusher.push(vec![0x00, 0x00, 0xab]).await.unwrap();
    pusher.push(complete(CD02)).await.unwrap();
    pusher.push(chunk(0, AB01, &[7])).await.unwrap();
    pusher.push(chunk(0, AB01, &[8])).await.unwrap();
    pusher.push(complete(AB01)).await.unwrap();
    drop(pusher);

    within(session.wait_ended()).await;
    let stats = session.stats();

    assert_eq!(stats.frames_received, 6);
    assert_eq!(stats.malformed_frames, 2);
    assert_eq!(stats.stray_markers, 1);
    assert_eq!(stats.chunks_buffered, 2);
    assert_eq!(stats.chunks_overwritten, 1);
    assert_eq!(stats.transfers_completed, 1);
    assert_eq!(stats.open_transfers, 0);
    assert_eq!(session.photos_snapshot()[0].as_ref(), &[8]);
}

#[tokio::test]
async fn unfinished_transfer_stays_buffered() {
    let (pusher, session) =
        Glasslink::channel(Arc::new(Collector::default()), &SessionConfig::default());

    pusher.push(chunk(0, AB01, &[1, 2, 3])).await.unwrap();
    drop(pusher);

    within(session.wait_ended()).await;
    let stats = session.stats();
    assert_eq!(stats.open_transfers, 1);
    assert_eq!(stats.buffered_bytes, 3);
    assert_eq!(session.photo_count(), 0);
}

#[tokio::test]
async fn failing_transform_drops_only_that_transfer() {
    let reject_small = |blob: glasslink::Blob| -> Result<glasslink::Blob, BoxError> {
        if blob.len() < 2 { Err("photo too small".into()) } else { Ok(blob) }
    };

    let (pusher, source) = glasslink::ChannelSource::new(8);
    let session = PhotoSession::attach_with_transform(
        source,
        Arc::new(Collector::default()),
        reject_small,
        &SessionConfig::default(),
    );

    pusher.push(chunk(0, AB01, &[1])).await.unwrap();
    pusher.push(complete(AB01)).await.unwrap();
    pusher.push(chunk(0, CD02, &[1, 2])).await.unwrap();
    pusher.push(complete(CD02)).await.unwrap();
    drop(pusher);

    within(session.wait_ended()).await;
    let stats = session.stats();
    assert_eq!(stats.transform_failures, 1);
    assert_eq!(stats.transfers_completed, 1);
    assert_eq!(session.photo_count(), 1);
}

#[tokio::test]
async fn photo_stream_follows_sink() {
    let (pusher, session) =
        Glasslink::channel(Arc::new(Collector::default()), &SessionConfig::default());
    let mut photos = session.photos();

    pusher.push(chunk(0, AB01, &[1])).await.unwrap();
    pusher.push(complete(AB01)).await.unwrap();
    pusher.push(chunk(0, CD02, &[2])).await.unwrap();
    pusher.push(complete(CD02)).await.unwrap();

    let first = within(photos.next()).await.unwrap();
    let second = within(photos.next()).await.unwrap();
    assert_eq!((first.as_ref(), second.as_ref()), (&[1u8][..], &[2u8][..]));

    session.close();
    assert!(within(photos.next()).await.is_none());
}

#[tokio::test]
async fn multiplexer_and_scheduler_compose_without_a_session() {
    let sink = BlobSink::new();
    let collector = Arc::new(Collector::default());
    let scheduler = CoalescedScheduler::new(sink.clone(), Arc::clone(&collector));
    let mut mux = TransferMultiplexer::new(sink);

    mux.accept_frame(&[0x00, 0x00, 0xab, 0x01, 1, 2]).unwrap();
    mux.accept_frame(&[0x01, 0x00, 0xab, 0x01, 3, 4]).unwrap();
    mux.accept_frame(&[0xff, 0xff, 0xab, 0x01]).unwrap();

    scheduler.invalidate();
    within(scheduler.wait_idle()).await;

    assert_eq!(collector.batches(), vec![vec![vec![1, 2, 3, 4]]]);
    assert_eq!(scheduler.cursor(), 1);
    assert!(matches!(
        scheduler.last_outcome().as_deref(),
        Some(PassOutcome::Delivered { from: 0, to: 1 })
    ));
}
