use peep_msg::{Id, MessageToBytesError, OptionError};

use crate::link::{NodeId, Radio, Timer};
use crate::platform::PlatformTypes;

/// An error encounterable from within Core
#[derive(Debug)]
pub struct Error<P: PlatformTypes> {
  /// The error that occurred. May bring some debug info with it.
  pub what: What<P>,
  /// What were we doing when it happened?
  pub when: When,
}

/// The context that an error occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum When {
  ReceivingFrame(NodeId),
  SendingMessage(NodeId, Id),
}

impl When {
  /// Attach the thing that went wrong to this context
  pub fn what<P: PlatformTypes>(self, what: What<P>) -> Error<P> {
    Error { what, when: self }
  }
}

/// A contextless error with some additional debug data attached.
#[derive(Debug)]
pub enum What<P: PlatformTypes> {
  /// The radio driver failed to put a frame on the air
  RadioError(<<P as PlatformTypes>::Radio as Radio>::Error),
  /// The host failed to arm a one-shot timer
  TimerError(<<P as PlatformTypes>::Timer as Timer>::Error),
  /// Serializing a message to bytes failed
  ToBytes(MessageToBytesError),
  /// Building a message's option table failed
  Option(OptionError),
  /// [`Core::reply`](super::Core::reply) was invoked for an exchange
  /// the bounded received-journal has since evicted
  ExchangeGone(Id),
}
