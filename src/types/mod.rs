//! Core types for the photo channel.
//!
//! - [`FrameEvent`] is one decoded notification frame (chunk or completion marker)
//! - [`TransferId`] identifies one logical transfer, rendered as 4 hex digits
//! - [`Blob`] is a fully reassembled photo payload, shared without copying
//! - [`SessionStats`] carries the inbound driver's diagnostic counters
//! - [`UpdateRate`] controls how often observation streams emit
//!
//! ## Usage Example
//!
//! ```rust
//! use glasslink::types::{FrameEvent, TransferId};
//!
//! let event = FrameEvent::decode(&[0x00, 0x00, 0xab, 0x01, 1, 2]).unwrap();
//! assert_eq!(event.transfer(), "ab01".parse::<TransferId>().unwrap());
//!
//! let marker = FrameEvent::decode(&[0xff, 0xff, 0xab, 0x01]).unwrap();
//! assert!(marker.is_complete());
//! ```

mod frame;
mod stats;
mod transfer_id;
mod update_rate;

use std::sync::Arc;

pub use frame::{COMPLETION_MARKER, FrameEvent, HEADER_LEN};
pub use stats::SessionStats;
pub use transfer_id::TransferId;
pub use update_rate::UpdateRate;

/// A reassembled photo payload.
///
/// Cloning shares the underlying bytes.
pub type Blob = Arc<[u8]>;
