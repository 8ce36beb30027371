use peep_msg::{Id, Token, Type};
use rand::RngCore;
use std_alloc::boxed::Box;

use crate::config::Config;
use crate::journal::Journal;
use crate::link::{Addrd, NodeId, Radio, Timer, TimerEvent};
use crate::platform::{Message, PlatformTypes};
use crate::resource::{Handler, Registry, ResourceHandle};
use crate::retry::Backoff;

mod error;
/// Core methods that manage inbound frames.
///
/// For core methods that manage outbound messages, see [`outbound`].
mod inbound;
/// Core methods that manage outbound messages.
///
/// For core methods that manage inbound frames, see [`inbound`].
mod outbound;

#[doc(inline)]
pub use error::*;

pub(crate) const SENT_CAPACITY: usize = 16;
pub(crate) const RECVD_CAPACITY: usize = 16;
pub(crate) const RESOURCE_CAPACITY: usize = 8;

/// How an exchange this node started concluded.
#[derive(Debug)]
pub enum Outcome<P: PlatformTypes> {
  /// The correspondent answered.
  Response(Addrd<Message<P>>),
  /// The correspondent could not correlate our message and reset
  /// the exchange.
  Reset,
  /// Every retransmission went unanswered and the exchange was
  /// given up on.
  Abandoned,
}

/// Continuation for an exchange this node started; invoked exactly once.
pub type ResponseHandler<P> = Box<dyn FnMut(Outcome<P>)>;

/// An outbound message awaiting acknowledgement and/or a response.
pub(crate) struct SentRecord<P: PlatformTypes> {
  pub(crate) msg: Addrd<Message<P>>,
  pub(crate) backoff: Backoff,
  pub(crate) acked: bool,
  pub(crate) on_done: Option<ResponseHandler<P>>,
}

/// A received request, remembered so retransmissions of it are answered
/// with the bytes already produced instead of being processed twice.
pub(crate) struct ReceivedRecord<P: PlatformTypes> {
  pub(crate) from: NodeId,
  pub(crate) id: Id,
  pub(crate) ty: Type,
  pub(crate) ack_sent: bool,
  pub(crate) reply: Option<Message<P>>,
}

/// The exchange state machine.
///
/// Owns the radio, the timer, the RNG, both exchange journals and the
/// resource registry; everything it does happens synchronously inside
/// [`Core::frame_recvd`], [`Core::timeout_elapsed`] or one of the
/// outbound calls ([`Core::get`], [`Core::reply`], ..), invoked by the
/// host's event loop. There is exactly one `Core` per node and it is
/// never shared.
#[allow(missing_debug_implementations)]
pub struct Core<P: PlatformTypes> {
  pub(crate) radio: P::Radio,
  pub(crate) timer: P::Timer,
  pub(crate) rand: P::Rand,
  pub(crate) config: Config,
  pub(crate) sent: Journal<SentRecord<P>, SENT_CAPACITY>,
  pub(crate) recvd: Journal<ReceivedRecord<P>, RECVD_CAPACITY>,
  pub(crate) resources: Registry<P, RESOURCE_CAPACITY>,
  next_id: u16,
  next_token: u32,
}

impl<P: PlatformTypes> Core<P> {
  /// Create a new Core.
  ///
  /// The message-id and token counters start at values drawn from
  /// `rand` so that a rebooted node does not resume a predecessor's
  /// id sequence and mis-correlate stale traffic.
  pub fn new(radio: P::Radio, timer: P::Timer, mut rand: P::Rand, config: Config) -> Self {
    let next_id = rand.next_u32() as u16;
    let next_token = rand.next_u32();

    Self { radio,
           timer,
           rand,
           config,
           sent: Journal::new(),
           recvd: Journal::new(),
           resources: Registry::new(),
           next_id,
           next_token }
  }

  /// Serve `path` (and the subtree below it) with `handler`.
  ///
  /// Yields `None` when the fixed-capacity registry is full.
  pub fn register_resource(&mut self, path: &str, handler: Handler<P>) -> Option<ResourceHandle> {
    self.resources.register(path, handler)
  }

  /// Stop serving the path registered under `handle`.
  pub fn unregister_resource(&mut self, handle: ResourceHandle) -> bool {
    self.resources.unregister(handle)
  }

  /// A timer armed through the injected [`Timer`](crate::link::Timer)
  /// elapsed.
  ///
  /// Tolerates events that outlived their exchange (see
  /// [`TimerEvent`]); acting on a stale event is a no-op.
  pub fn timeout_elapsed(&mut self, event: TimerEvent) -> Result<(), Error<P>> {
    match event {
      | TimerEvent::AckDue(handle) => self.ack_due(handle),
      | TimerEvent::Retransmit(handle) => self.retransmit_due(handle),
    }
  }

  pub(crate) fn next_id(&mut self) -> Id {
    let id = Id(self.next_id);
    self.next_id = self.next_id.wrapping_add(1);
    id
  }

  pub(crate) fn next_token(&mut self) -> Token {
    let token = Token::from_counter(self.next_token);
    self.next_token = self.next_token.wrapping_add(1);
    token
  }
}
