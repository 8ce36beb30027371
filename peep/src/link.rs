use tinyvec::ArrayVec;

use crate::config::Millis;
use crate::journal::Handle;

/// First byte of every frame we send or accept; anything else sharing the
/// channel (routing beacons, neighbor discovery, ..) is not ours and is
/// ignored.
pub const FRAME_MARKER: u8 = 51;

/// A radio node's link-layer address.
#[derive(PartialEq, PartialOrd, Eq, Ord, Hash, Debug, Clone, Copy, Default)]
pub struct NodeId(pub u16);

/// Data that came from (or is headed to) a correspondent node
#[derive(PartialEq, PartialOrd, Eq, Ord, Hash, Debug, Clone, Copy)]
pub struct Addrd<T>(pub T, pub NodeId);

impl<T> Addrd<T> {
  /// Borrow the contents of this Addrd
  pub fn as_ref(&self) -> Addrd<&T> {
    Addrd(self.data(), self.addr())
  }

  /// Discard the address and get the data in this Addrd
  pub fn unwrap(self) -> T {
    self.0
  }

  /// Map the data contained in this Addrd
  pub fn map<R>(self, f: impl FnOnce(T) -> R) -> Addrd<R> {
    Addrd(f(self.0), self.1)
  }

  /// Map the data contained in this Addrd (with a copy of the address)
  pub fn map_with_addr<R>(self, f: impl FnOnce(T, NodeId) -> R) -> Addrd<R> {
    Addrd(f(self.0, self.1), self.1)
  }

  /// Borrow the contents of the addressed item
  pub fn data(&self) -> &T {
    &self.0
  }

  /// Mutably borrow the contents of the addressed item
  pub fn data_mut(&mut self) -> &mut T {
    &mut self.0
  }

  /// Copy the node address for the data
  pub fn addr(&self) -> NodeId {
    self.1
  }

  /// Turn the entire structure into something else
  pub fn fold<R>(self, f: impl FnOnce(T, NodeId) -> R) -> R {
    f(self.0, self.1)
  }
}

impl<T> AsMut<T> for Addrd<T> {
  fn as_mut(&mut self) -> &mut T {
    &mut self.0
  }
}

/// One whole radio frame: the marker byte plus a serialized message.
///
/// The capacity is the protocol marker plus the largest message body
/// we will put on the air.
pub type Frame = ArrayVec<[u8; 256]>;

/// A serialized message body, sized so that marker + body always fits
/// in a [`Frame`].
pub(crate) type FrameBody = ArrayVec<[u8; 255]>;

/// The radio beneath the engine.
///
/// This mirrors the socket traits of embedded UDP stacks but is
/// addressed by link-layer node id; the driver is expected to deliver
/// whole frames, in order, with no fragmentation.
pub trait Radio {
  /// The error yielded by radio operations
  type Error: core::fmt::Debug;

  /// This node's own address (used to drop our own broadcasts)
  fn id(&self) -> NodeId;

  /// Send one frame to a remote node
  fn send(&mut self, frame: Addrd<&[u8]>) -> nb::Result<(), Self::Error>;
}

/// Why a timer was armed; handed back to
/// [`Core::timeout_elapsed`](crate::core::Core::timeout_elapsed)
/// when it fires.
///
/// Carries a generation-tagged journal [`Handle`] rather than a borrowed
/// record: by the time the timer fires the exchange may have been
/// evicted and its slot reused, in which case the stale handle simply
/// misses.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum TimerEvent {
  /// The deferred-ACK grace period for a received CON request elapsed
  AckDue(Handle),
  /// A confirmable message may need to be retransmitted
  Retransmit(Handle),
}

/// The host's one-shot timer facility.
///
/// `schedule` must arrange for the event to be handed to
/// [`Core::timeout_elapsed`](crate::core::Core::timeout_elapsed) once
/// `after` has passed. There is no cancellation; the engine tolerates
/// stale events instead.
pub trait Timer {
  /// The error yielded when a timer cannot be armed
  type Error: core::fmt::Debug;

  /// Arm a one-shot timer.
  fn schedule(&mut self, after: Millis, event: TimerEvent) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn addrd_combinators() {
    let addrd = Addrd(21u32, NodeId(3));
    assert_eq!(addrd.map(|n| n * 2), Addrd(42, NodeId(3)));
    assert_eq!(addrd.map_with_addr(|n, NodeId(id)| n + id as u32),
               Addrd(24, NodeId(3)));
    assert_eq!(addrd.fold(|n, id| (n, id)), (21, NodeId(3)));
  }
}
