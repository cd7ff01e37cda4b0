//! Frame reassembly.
//!
//! Frames of several transfers may interleave on one channel. The
//! [`TransferMultiplexer`] keeps one [`TransferBuffer`] per open transfer id,
//! seals it when the transfer's completion marker arrives, and appends the
//! ordered concatenation of its chunks to the [`BlobSink`](crate::BlobSink).
//!
//! ```rust
//! use glasslink::{BlobSink, TransferMultiplexer};
//!
//! let sink = BlobSink::new();
//! let mut mux = TransferMultiplexer::new(sink.clone());
//!
//! mux.accept_frame(&[0x01, 0x00, 0xab, 0x01, 3, 4]).unwrap();
//! mux.accept_frame(&[0x00, 0x00, 0xab, 0x01, 1, 2]).unwrap();
//! mux.accept_frame(&[0xff, 0xff, 0xab, 0x01]).unwrap();
//!
//! assert_eq!(sink.snapshot()[0].as_ref(), &[1, 2, 3, 4]);
//! ```

mod buffer;
mod multiplexer;

pub use buffer::TransferBuffer;
pub use multiplexer::{Routed, TransferMultiplexer};
