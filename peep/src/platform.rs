use core::fmt::Debug;

use peep_msg::{OpaqueOption, StringOption, UintOption};
use rand::RngCore;
#[cfg(feature = "alloc")]
use std_alloc::vec::Vec;
use toad_array::{AppendCopy, Array};

use crate::link::{Radio, Timer};

/// peep configuration trait
///
/// Bundles every type the engine is generic over: the collections
/// backing messages, the radio, the timer and the random source.
/// One implementor ([`Alloc`]) is provided; heapless platforms
/// implement this once with `tinyvec` collections and their drivers.
pub trait PlatformTypes: Sized + 'static + Debug {
  /// What type should we use to store the message payloads?
  type MessagePayload: Array<Item = u8> + AppendCopy<u8> + Clone + Debug + PartialEq;

  /// What type should we use to store string & opaque option values?
  type OptionValue: Array<Item = u8> + AppendCopy<u8> + Clone + Debug + PartialEq + 'static;

  /// What type should we use to store the integer-valued options?
  type Uints: Array<Item = UintOption> + Clone + Debug + PartialEq;

  /// What type should we use to store the text-valued options?
  type Strings: Array<Item = StringOption<Self::OptionValue>> + Clone + Debug + PartialEq;

  /// What type should we use to store the raw-bytes options?
  type Opaques: Array<Item = OpaqueOption<Self::OptionValue>> + Clone + Debug + PartialEq;

  /// What should we use to reach the air?
  type Radio: Radio;

  /// What should we use to arm one-shot timers?
  type Timer: Timer;

  /// What should we use for message-id/token seeding & retransmission
  /// jitter?
  type Rand: RngCore;
}

/// [`peep_msg::Message`] shorthand using Platform types
pub type Message<P> = peep_msg::Message<<P as PlatformTypes>::MessagePayload,
                                        <P as PlatformTypes>::OptionValue,
                                        <P as PlatformTypes>::Uints,
                                        <P as PlatformTypes>::Strings,
                                        <P as PlatformTypes>::Opaques>;

/// Configures `peep` to use `Vec` for collections, with the radio,
/// timer and RNG left to the host.
///
/// ```
/// use peep::platform::Alloc;
/// # use peep::link::{Addrd, NodeId, Radio, Timer, TimerEvent};
/// # use peep::config::Millis;
/// # #[derive(Debug)]
/// # struct MyRadio;
/// # impl Radio for MyRadio {
/// #   type Error = ();
/// #   fn id(&self) -> NodeId { NodeId(1) }
/// #   fn send(&mut self, _: Addrd<&[u8]>) -> nb::Result<(), ()> { Ok(()) }
/// # }
/// # #[derive(Debug)]
/// # struct MyTimer;
/// # impl Timer for MyTimer {
/// #   type Error = ();
/// #   fn schedule(&mut self, _: Millis, _: TimerEvent) -> Result<(), ()> { Ok(()) }
/// # }
///
/// type Platform = Alloc<MyRadio, MyTimer, rand_chacha::ChaCha8Rng>;
/// ```
#[cfg(feature = "alloc")]
#[cfg_attr(docsrs, doc(cfg(feature = "alloc")))]
#[derive(Copy)]
pub struct Alloc<R, T, G>(core::marker::PhantomData<(R, T, G)>)
  where R: Radio + 'static,
        T: Timer + 'static,
        G: RngCore + 'static;

#[cfg(feature = "alloc")]
impl<R: Radio + 'static, T: Timer + 'static, G: RngCore + 'static> Debug for Alloc<R, T, G> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(f, "Alloc::<_, _, _>(_)")
  }
}

#[cfg(feature = "alloc")]
impl<R: Radio + 'static, T: Timer + 'static, G: RngCore + 'static> Clone for Alloc<R, T, G> {
  fn clone(&self) -> Self {
    Self(Default::default())
  }
}

#[cfg(feature = "alloc")]
impl<R, T, G> PlatformTypes for Alloc<R, T, G>
  where R: Radio + 'static,
        T: Timer + 'static,
        G: RngCore + 'static
{
  type MessagePayload = Vec<u8>;
  type OptionValue = Vec<u8>;
  type Uints = Vec<UintOption>;
  type Strings = Vec<StringOption<Vec<u8>>>;
  type Opaques = Vec<OpaqueOption<Vec<u8>>>;
  type Radio = R;
  type Timer = T;
  type Rand = G;
}
