//! Low-level representation of draft-03 CoAP messages.
//!
//! The most notable item in `peep_msg` is `Message`;
//! a CoAP message very close to the actual byte layout
//! spoken by constrained sensor radios.
//!
//! ## The draft-03 wire format
//! This crate speaks the *draft* revision of CoAP used on
//! single-frame sensor radios, which differs from RFC7252 in a
//! few load-bearing ways:
//! - the first header byte carries a 4-bit **option count**, not a token length
//! - the token is an ordinary option (number 11), not a header field
//! - option deltas are 4 bits with no escape; zero-length **fencepost**
//!   options (number 14, 28, ..) bridge gaps wider than 15
//! - the payload is unframed; it is simply every byte after the last option
//!
//! ## Allocation
//! CoAP messages have some attributes whose size is dynamic:
//! - The message payload (in http terms: the request/response body)
//! - the number of options (in http terms: headers)
//! - the value of an option (in http terms: header value)
//!
//! `Message` does not require an allocator and has no opinions about what
//! kind of collection it uses internally to store these values.
//!
//! It solves this problem by being generic over the collections it needs,
//! using the [`toad_array::Array`] trait to capture its idea of what makes
//! a collection useful.
//!
//! This means that you may use a provided implementation (for `Vec` or
//! `tinyvec::ArrayVec`) or provide your own collection.
//!
//! ```rust
//! //! Note: both of these type aliases are exported by `peep_msg` for convenience.
//!
//! use tinyvec::ArrayVec;
//! use peep_msg::{Message, OpaqueOption, StringOption, UintOption};
//!
//! //                        Message Payload byte buffer
//! //                        |
//! //                        |        Option Value byte buffer
//! //                        |        |
//! //                        |        |        the 3 typed option collections
//! //                        vvvvvvv  vvvvvvv  vvvvvvvvvvvvvvvvvvvvvvvvvvvvv
//! type VecMessage = Message<Vec<u8>, Vec<u8>, Vec<UintOption>,
//!                           Vec<StringOption<Vec<u8>>>,
//!                           Vec<OpaqueOption<Vec<u8>>>>;
//! ```
//!
//! It may look a little ugly, but a core goal of `peep` is to be
//! platform- and alloc-agnostic.

// docs
#![doc(html_root_url = "https://docs.rs/peep-msg/0.4.1")]
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

#[cfg(feature = "alloc")]
extern crate alloc as std_alloc;

#[doc(hidden)]
pub mod code;
#[doc(hidden)]
pub mod from_bytes;
#[doc(hidden)]
pub mod opt;
#[doc(hidden)]
pub mod to_bytes;

#[doc(inline)]
pub use code::*;
#[doc(inline)]
pub use from_bytes::{MessageParseError, TryFromBytes};
#[doc(inline)]
pub use opt::*;
#[cfg(feature = "alloc")]
use std_alloc::vec::Vec;
use tinyvec::ArrayVec;
use toad_array::{AppendCopy, Array};
#[doc(inline)]
pub use to_bytes::{MessageToBytesError, TryIntoBytes};

/// The request/response body; every byte of the frame after the last option.
///
/// The length is implied by the frame length rather than delimited,
/// which is only sound because the radio transport delivers whole
/// frames. A stream transport would need explicit length framing.
#[derive(Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct Payload<C: Array<Item = u8>>(pub C);

/// Message that uses Vec byte buffers
#[cfg(feature = "alloc")]
pub type VecMessage = Message<Vec<u8>,
                              Vec<u8>,
                              Vec<UintOption>,
                              Vec<StringOption<Vec<u8>>>,
                              Vec<OpaqueOption<Vec<u8>>>>;

/// Message that uses static fixed-capacity stack-allocating byte buffers
///
/// Used like: `ArrayVecMessage<64, 16, 4, 8, 2>`; a message that can store
/// a payload up to 64 bytes, option values up to 16 bytes, and 4 uint / 8
/// string / 2 opaque options.
pub type ArrayVecMessage<const PAYLOAD_CAP: usize,
                         const VAL_CAP: usize,
                         const N_UINT: usize,
                         const N_STR: usize,
                         const N_OPAQUE: usize> =
  Message<ArrayVec<[u8; PAYLOAD_CAP]>,
          ArrayVec<[u8; VAL_CAP]>,
          ArrayVec<[UintOption; N_UINT]>,
          ArrayVec<[StringOption<ArrayVec<[u8; VAL_CAP]>>; N_STR]>,
          ArrayVec<[OpaqueOption<ArrayVec<[u8; VAL_CAP]>>; N_OPAQUE]>>;

/// # `Message` struct
/// Low-level representation of a message that has been parsed from,
/// or will be serialized to, the raw draft-03 binary format.
///
/// Note that `Message` is generic over 5 [`Array`]s:
///  - `P`: the byte buffer used to store the message's [`Payload`]
///  - `C`: byte buffer used to store string & opaque option values
///  - `U`, `S`, `O`: the typed option collections in the [`OptionTable`]
///
/// Messages support both serializing to bytes and from bytes, by using the
/// provided [`TryFromBytes`] and [`TryIntoBytes`] traits.
///
/// ```
/// use peep_msg::{Code, Id, Type, TryFromBytes, VecMessage};
///
/// let packet: Vec<u8> = vec![0x50, 0x00, 0x00, 0x07];
///
/// let msg = VecMessage::try_from_bytes(packet).unwrap();
/// assert_eq!(msg.ty, Type::Non);
/// assert_eq!(msg.code, Code::EMPTY);
/// assert_eq!(msg.id, Id(7));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Message<P, C, U, S, O>
  where P: Array<Item = u8>,
        C: Array<Item = u8>,
        U: Array<Item = UintOption>,
        S: Array<Item = StringOption<C>>,
        O: Array<Item = OpaqueOption<C>>
{
  /// see [`Id`] for details
  pub id: Id,
  /// see [`Type`] for details
  pub ty: Type,
  /// see [`Version`] for details
  pub ver: Version,
  /// see [`Code`] for details
  pub code: Code,
  /// see [`OptionTable`] for details
  pub opts: OptionTable<C, U, S, O>,
  /// see [`Payload`]
  pub payload: Payload<P>,
}

impl<P, C, U, S, O> Message<P, C, U, S, O>
  where P: Array<Item = u8>,
        C: Array<Item = u8> + AppendCopy<u8>,
        U: Array<Item = UintOption>,
        S: Array<Item = StringOption<C>>,
        O: Array<Item = OpaqueOption<C>>
{
  /// Create a message of some [`Type`] and [`Code`] with no options or payload.
  pub fn new(ty: Type, code: Code, id: Id) -> Self {
    Self { id,
           ty,
           ver: Version::default(),
           code,
           opts: OptionTable::default(),
           payload: Payload(P::default()) }
  }

  /// Is this message a request? (code 1..=31)
  pub fn is_request(&self) -> bool {
    self.code.kind() == CodeKind::Request
  }

  /// Is this message a response? (code 64..=191)
  pub fn is_response(&self) -> bool {
    self.code.kind() == CodeKind::Response
  }

  /// Is this message empty? (code 0, e.g. a bare ACK or RST)
  pub fn is_empty(&self) -> bool {
    self.code.kind() == CodeKind::Empty
  }

  /// Shorthand for [`OptionTable::token`] on [`Self::opts`].
  pub fn token(&self) -> Option<Token> {
    self.opts.token()
  }
}

/// Struct representing the first byte of a message.
///
/// ```text
/// CoAP version
/// |
/// |  Message type (CON, NON, ACK, RST)
/// |  |
/// |  |  Number of options in the message. (4-bit integer)
/// |  |  |
/// vv vv vvvv
/// 01 00 0000
/// ```
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub(crate) struct Byte1 {
  pub(crate) ver: Version,
  pub(crate) ty: Type,
  pub(crate) opt_count: u8,
}

/// # Message ID
///
/// 16-bit unsigned integer in network byte order. Used to
/// detect message duplication and to match messages of type
/// Acknowledgement/Reset to messages of type Confirmable/Non-
/// confirmable.
///
/// For the difference between [`Id`] and [`Token`]: the id pairs an ACK
/// with the one transmission it acknowledges, while the token pairs a
/// response with the request it answers, however many messages later.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Id(pub u16);

/// Indicates if this message is of
/// type Confirmable (0), Non-confirmable (1), Acknowledgement (2), or Reset (3).
#[derive(Copy, Clone, Eq, Ord, PartialEq, PartialOrd, Debug)]
pub enum Type {
  /// Some messages require an acknowledgement. These messages are
  /// called "Confirmable". When no packets are lost, each Confirmable
  /// message elicits exactly one return message of type Acknowledgement
  /// or type Reset.
  Con,
  /// Some messages do not require an acknowledgement. This is
  /// particularly true for messages that are repeated regularly for
  /// application requirements, such as repeated readings from a sensor.
  Non,
  /// An Acknowledgement message acknowledges that a specific
  /// Confirmable message arrived. It may also carry a response
  /// ("piggybacked" on the acknowledgement).
  Ack,
  /// A Reset message indicates that a specific message (Confirmable or
  /// Non-confirmable) was received, but some context is missing to
  /// properly process it.
  Reset,
}

/// Version of the CoAP protocol that the message adheres to.
///
/// Always 1 in this draft revision.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Version(pub u8);

impl Default for Version {
  fn default() -> Self {
    Version(1)
  }
}

/// An opaque sequence of 0-8 bytes binding a response to the request that
/// caused it.
///
/// On the wire this is just the value of option 11; it gets a dedicated
/// type because the exchange layer correlates on it constantly.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct Token(pub tinyvec::ArrayVec<[u8; 8]>);

impl Token {
  /// The fewest big-endian bytes that represent `n`.
  ///
  /// Used by exchange runtimes that mint tokens from a counter.
  pub fn from_counter(n: u32) -> Self {
    let skip = (n.leading_zeros() / 8) as usize;
    let bytes = n.to_be_bytes();

    match skip {
      | 4 => Token(tinyvec::array_vec!([u8; 8] => 0)),
      | _ => Token(bytes.iter().skip(skip).copied().collect()),
    }
  }
}

#[cfg(test)]
pub(crate) fn test_msg() -> (VecMessage, Vec<u8>) {
  let header: [u8; 4] = [0b01_00_0010, 0x01, 0x00, 0x01];
  let options: &[u8] = &[0x94, b't', b'e', b'm', b'p', 0x22, 0xDE, 0xAD];
  let payload: &[u8] = b"23.1";
  let bytes = [header.as_ref(), options, payload].concat();

  let mut msg = VecMessage::new(Type::Con, Code::GET, Id(1));
  msg.opts.add_string(opt::URI_PATH, "temp").unwrap();
  msg.opts
     .set_token(Token(tinyvec::array_vec!([u8; 8] => 0xDE, 0xAD)))
     .unwrap();
  msg.payload = Payload(payload.iter().copied().collect());

  (msg, bytes)
}

#[cfg(test)]
pub(crate) mod tests {
  /// Assert two byte values are equal, printing both in binary on failure.
  #[macro_export]
  macro_rules! assert_eqb {
    ($actual:expr, $expected:expr) => {
      if $actual != $expected {
        panic!("expected {:08b} to equal {:08b}", $actual, $expected)
      }
    };
  }

  /// Assert two byte iterables are equal, printing both in binary on failure.
  #[macro_export]
  macro_rules! assert_eqb_iter {
    ($actual:expr, $expected:expr) => {
      if $actual.iter().ne($expected.iter()) {
        panic!("expected {:?} to equal {:?}",
               $actual.into_iter().map(|b| format!("{:08b}", b)).collect::<Vec<_>>(),
               $expected.into_iter().map(|b| format!("{:08b}", b)).collect::<Vec<_>>())
      }
    };
  }

  use super::*;

  #[test]
  fn token_from_counter_strips_leading_zeroes() {
    assert_eq!(Token::from_counter(0x01).0.as_ref(), &[0x01]);
    assert_eq!(Token::from_counter(0xBEEF).0.as_ref(), &[0xBE, 0xEF]);
    assert_eq!(Token::from_counter(0x01020304).0.as_ref(),
               &[0x01, 0x02, 0x03, 0x04]);
  }

  #[test]
  fn token_from_counter_zero_is_one_byte() {
    // a zero-length token would mean "no token at all"
    assert_eq!(Token::from_counter(0).0.as_ref(), &[0x00]);
  }
}
