//! `peep` is the exchange layer of the draft-03 CoAP stack:
//! it turns a stream of single radio frames into correctly ordered
//! request/response exchanges, with confirmable retransmission,
//! deduplication, piggybacked & separate acknowledgement, and
//! resource dispatch — in bounded memory, on one thread.
//!
//! ## The host contract
//! The engine owns no event loop. The host environment:
//! - hands every received radio frame to [`core::Core::frame_recvd`]
//! - arms one-shot timers through the injected [`link::Timer`] and,
//!   when one elapses, hands its [`link::TimerEvent`] back to
//!   [`core::Core::timeout_elapsed`]
//! - drives outbound traffic through [`core::Core::get`] /
//!   [`core::Core::reply`] and friends
//!
//! Everything happens synchronously inside those calls; a logical
//! "wait for ACK" is nothing but a journal entry plus a scheduled
//! timer event.
//!
//! ```text
//! radio rx ─▶ frame_recvd ─▶ decode ─▶ journals / resources ─▶ encode ─▶ radio tx
//!                 ▲                                                        │
//!                 └──────────────── timer events ◀────────────────────────-┘
//! ```
//!
//! ## Coexistence
//! Frames start with a 1-byte protocol marker ([`link::FRAME_MARKER`]);
//! anything else on the same channel is ignored, as are our own
//! broadcasts.

// docs
#![doc(html_root_url = "https://docs.rs/peep/0.4.1")]
#![cfg_attr(any(docsrs, feature = "docs"), feature(doc_cfg))]
// -
// style
#![allow(clippy::unused_unit)]
// -
// deny
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![deny(missing_copy_implementations)]
#![cfg_attr(not(test), deny(unsafe_code))]
// -
// warnings
#![cfg_attr(not(test), warn(unreachable_pub))]
// -
// features
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc as std_alloc;

/// Runtime behavior knobs (timeouts, attempt limits)
pub mod config;
/// The exchange state machine
pub mod core;
/// Bounded FIFO-evicting exchange logs
pub mod journal;
/// The seam to the outside world: node ids, frames, radio & timer traits
pub mod link;
/// Type-level wiring of collections, radio, timer and RNG
pub mod platform;
/// URI path → handler registry
pub mod resource;
/// Exponential backoff bookkeeping for confirmable messages
pub mod retry;
