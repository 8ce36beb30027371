use tinyvec::ArrayVec;
use toad_array::{AppendCopy, Array};

use crate::*;

/// Trait for converting a sequence of bytes into some data structure
pub trait TryFromBytes<T>: Sized {
  /// Error type yielded if conversion fails
  type Error;

  /// Try to convert from some sequence of bytes `T`
  /// into `Self`
  fn try_from_bytes<I: IntoIterator<Item = T>>(bytes: I) -> Result<Self, Self::Error>;
}

/// Errors encounterable while parsing a message from bytes
///
/// Note that this is deliberately small: a truncated or garbled *option*
/// is not an error, because the draft asks receivers to keep whatever
/// they could read and skip what they could not (see
/// [`TryFromBytes::try_from_bytes`]). Only a frame too short to carry
/// the fixed 4-byte header is unusable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageParseError {
  /// Reached end of stream before the 4-byte header was read
  UnexpectedEndOfStream,
}

impl MessageParseError {
  pub(crate) fn try_next<I>(iter: &mut impl Iterator<Item = I>) -> Result<I, Self> {
    iter.next().ok_or(Self::UnexpectedEndOfStream)
  }
}

fn type_from_bits(b: u8) -> Type {
  match b & 0b11 {
    | 0 => Type::Con,
    | 1 => Type::Non,
    | 2 => Type::Ack,
    | _ => Type::Reset,
  }
}

impl TryFrom<u8> for Byte1 {
  type Error = MessageParseError;

  fn try_from(b: u8) -> Result<Self, Self::Error> {
    let ver = b >> 6; // bits 0 & 1
    let ty = b >> 4 & 0b11; // bits 2 & 3
    let opt_count = b & 0b1111u8; // last 4 bits

    Ok(Byte1 { ver: Version(ver),
               ty: type_from_bits(ty),
               opt_count })
  }
}

impl<'a, P, C, U, S, O> TryFromBytes<&'a u8> for Message<P, C, U, S, O>
  where P: Array<Item = u8>,
        C: Array<Item = u8> + AppendCopy<u8>,
        U: Array<Item = UintOption>,
        S: Array<Item = StringOption<C>>,
        O: Array<Item = OpaqueOption<C>>
{
  type Error = MessageParseError;

  fn try_from_bytes<I: IntoIterator<Item = &'a u8>>(bytes: I) -> Result<Self, Self::Error> {
    Self::try_from_bytes(bytes.into_iter().copied())
  }
}

impl<P, C, U, S, O> TryFromBytes<u8> for Message<P, C, U, S, O>
  where P: Array<Item = u8>,
        C: Array<Item = u8> + AppendCopy<u8>,
        U: Array<Item = UintOption>,
        S: Array<Item = StringOption<C>>,
        O: Array<Item = OpaqueOption<C>>
{
  type Error = MessageParseError;

  fn try_from_bytes<I: IntoIterator<Item = u8>>(bytes: I) -> Result<Self, Self::Error> {
    let mut bytes = bytes.into_iter();

    let Byte1 { ver,
                ty,
                opt_count, } = Self::Error::try_next(&mut bytes)?.try_into()?;
    let code: Code = Self::Error::try_next(&mut bytes)?.into();
    let id_hi = Self::Error::try_next(&mut bytes)?;
    let id_lo = Self::Error::try_next(&mut bytes)?;

    let mut msg = Message::new(ty, code, Id(u16::from_be_bytes([id_hi, id_lo])));
    msg.ver = ver;

    // Every option header parsed counts against opt_count, fenceposts and
    // unknown numbers included; that is what keeps the payload boundary
    // exact. A truncated option aborts the loop but keeps what was
    // already stored.
    let mut prev = 0u16;
    let mut parsed = 0u8;

    'opts: while parsed < opt_count {
      let header = match bytes.next() {
        | Some(b) => b,
        | None => break 'opts,
      };

      let delta = header >> 4;
      let len = match header & 0b1111 {
        | 15 => match bytes.next() {
          | Some(escape) => 15usize + escape as usize,
          | None => break 'opts,
        },
        | n => n as usize,
      };

      let value = bytes.by_ref().take(len).collect::<ArrayVec<[u8; 270]>>();
      if value.len() < len {
        break 'opts;
      }

      let number = prev + delta as u16;
      if number <= u8::MAX as u16
         && msg.opts
               .decode_push(OptNumber(number as u8), &value)
               .is_err()
      {
        // a full fixed-capacity sub-collection; keep what fit
        break 'opts;
      }

      prev = number;
      parsed += 1;
    }

    msg.payload = Payload(bytes.collect());

    Ok(msg)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::to_bytes::TryIntoBytes;

  #[test]
  fn parse_msg() {
    let (expect, bytes) = crate::test_msg();
    assert_eq!(VecMessage::try_from_bytes(&bytes).unwrap(), expect)
  }

  #[test]
  fn parse_byte1() {
    let byte = 0b_01_10_0011u8;
    let byte = Byte1::try_from(byte).unwrap();
    assert_eq!(byte,
               Byte1 { ver: Version(1),
                       ty: Type::Ack,
                       opt_count: 3 })
  }

  #[test]
  fn parse_path_and_marker() {
    let bytes = [[0x43u8, 0x01, 0xA4, 0xF2, 0x97].as_ref(),
                 b"storage".as_ref(),
                 &[0x0B],
                 b"KAESEKUCHEN".as_ref(),
                 &[0xC1, 0x00]].concat();
    assert_eq!(bytes.len(), 26);

    let msg = VecMessage::try_from_bytes(&bytes).unwrap();

    assert_eq!(msg.ty, Type::Con);
    assert_eq!(msg.code, Code::GET);
    assert_eq!(msg.id, Id(0xA4F2));
    assert_eq!(msg.opts.uri_path(), "storage/KAESEKUCHEN");
    assert!(msg.opts.if_none_match());
    assert!(msg.payload.0.is_empty());

    // re-serializing drops the redundant zero-length-value byte the peer
    // sent on If-None-Match
    assert_eq!(msg.wire_size(), 25);
    let reserialized: Vec<u8> = msg.try_into_bytes().unwrap();
    assert_eq!(reserialized.len(), 25);
    assert_eq!(reserialized[24], 0xC0);
  }

  #[test]
  fn truncated_header_is_an_error() {
    assert_eq!(VecMessage::try_from_bytes([0x50u8, 0x00, 0x00]),
               Err(MessageParseError::UnexpectedEndOfStream));
  }

  #[test]
  fn truncated_option_keeps_accumulated_state() {
    // Uri-Path "temp" then an option claiming 9 value bytes but carrying 2
    let bytes = [[0x42u8, 0x01, 0x00, 0x01, 0x94].as_ref(),
                 b"temp".as_ref(),
                 &[0x29, 0xDE, 0xAD]].concat();

    let msg = VecMessage::try_from_bytes(&bytes).unwrap();
    assert_eq!(msg.opts.uri_path(), "temp");
    assert_eq!(msg.opts.token(), None);
    assert!(msg.payload.0.is_empty());
  }

  #[test]
  fn unknown_options_are_skipped_but_counted() {
    // option 10 (unknown to the registry) between Uri-Path and the payload
    let bytes = [[0x42u8, 0x01, 0x00, 0x01, 0x94].as_ref(),
                 b"temp".as_ref(),
                 &[0x12, 0xAB, 0xCD],
                 b"payload".as_ref()].concat();

    let msg = VecMessage::try_from_bytes(&bytes).unwrap();
    assert_eq!(msg.opts.uri_path(), "temp");
    assert_eq!(msg.opts.count(), 1);
    assert_eq!(msg.payload.0, b"payload");
  }

  #[test]
  fn fencepost_with_trailing_payload() {
    let mut msg = VecMessage::new(Type::Non, Code::CONTENT, Id(9));
    msg.opts.set_if_none_match(true);
    msg.payload = Payload(b"data".iter().copied().collect());

    let bytes: Vec<u8> = msg.clone().try_into_bytes().unwrap();
    let parsed = VecMessage::try_from_bytes(&bytes).unwrap();
    assert_eq!(parsed, msg);
  }

  #[test]
  fn round_trips() {
    let msgs: Vec<VecMessage> = {
      let mut a = VecMessage::new(Type::Con, Code::GET, Id(77));
      a.opts.set_uint(opt::CONTENT_TYPE, 40).unwrap();
      a.opts.set_uint(opt::MAX_AGE, 0).unwrap();
      a.opts.set_uri_path("a/bb/ccc").unwrap();
      a.opts
       .set_token(Token(tinyvec::array_vec!([u8; 8] => 1, 2)))
       .unwrap();
      a.opts.add_uint(opt::ACCEPT, 41).unwrap();
      a.opts.add_opaque(opt::ETAG, &[9, 9, 9]).unwrap();
      a.opts.set_if_none_match(true);
      a.payload = Payload(b"the payload".iter().copied().collect());

      let mut b = VecMessage::new(Type::Ack, Code::CHANGED, Id(0xFFFF));
      b.opts
       .set_string(opt::URI_HOST, core::str::from_utf8(&[b'h'; 30]).unwrap())
       .unwrap();
      b.opts.add_string(opt::URI_QUERY, "k=v").unwrap();

      vec![VecMessage::new(Type::Non, Code::EMPTY, Id(0)),
           crate::test_msg().0,
           a,
           b]
    };

    for msg in msgs {
      let bytes: Vec<u8> = msg.clone().try_into_bytes().unwrap();
      assert_eq!(VecMessage::try_from_bytes(&bytes).unwrap(), msg);
    }
  }
}
