use toad_array::Array;
use toad_len::Len;

use crate::opt::{uint_len, HasNumber, FENCEPOST_BASE};
use crate::*;

/// Trait allowing fallible conversion into bytes
pub trait TryIntoBytes {
  /// Error type yielded if conversion fails
  type Error;

  /// Try to convert into a collection of bytes
  ///
  /// ```
  /// use peep_msg::{Code, Id, TryIntoBytes, Type, VecMessage};
  ///
  /// let msg = VecMessage::new(Type::Non, Code::EMPTY, Id(0));
  /// let bytes: Vec<u8> = msg.try_into_bytes().unwrap();
  /// assert_eq!(bytes, vec![0x50, 0x00, 0x00, 0x00]);
  /// ```
  fn try_into_bytes<C: Array<Item = u8>>(self) -> Result<C, Self::Error>;
}

/// Errors encounterable serializing to bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageToBytesError {
  /// Reserved capacity was not enough for size of message
  TooLong {
    /// Capacity of the byte buffer
    capacity: usize,
    /// Size of the message
    size: usize,
  },
  /// The header's option count is a 4-bit field; this message's options
  /// (fenceposts included) do not fit in it
  TooManyOptions(usize),
}

/// An option value about to hit the wire.
///
/// Uints are re-encoded to their minimal big-endian form here, which is
/// what makes re-serializing a parsed message drop redundant bytes
/// (e.g. an If-None-Match that arrived carrying a zero value byte).
pub(crate) enum WireValue<'a> {
  Uint { buf: [u8; 4], skip: u8 },
  Bytes(&'a [u8]),
  Marker,
}

impl<'a> WireValue<'a> {
  fn uint(v: u32) -> Self {
    WireValue::Uint { buf: v.to_be_bytes(),
                      skip: (4 - uint_len(v)) as u8 }
  }

  fn as_slice(&self) -> &[u8] {
    match self {
      | WireValue::Uint { buf, skip } => &buf[*skip as usize..],
      | WireValue::Bytes(b) => b,
      | WireValue::Marker => &[],
    }
  }

  fn len(&self) -> usize {
    self.as_slice().len()
  }
}

/// Merges the three typed sub-collections (plus the If-None-Match marker)
/// into one strictly ascending run of (number, value) pairs.
///
/// Numbers never collide across collections because the registry assigns
/// each number exactly one format.
pub(crate) struct WireOpts<'a, C: Array<Item = u8>> {
  uints: &'a [UintOption],
  strings: &'a [StringOption<C>],
  opaques: &'a [OpaqueOption<C>],
  marker: bool,
}

impl<'a, C: Array<Item = u8>> Iterator for WireOpts<'a, C> {
  type Item = (u8, WireValue<'a>);

  fn next(&mut self) -> Option<Self::Item> {
    let heads = [self.uints.first().map(|o| o.number().0),
                 self.strings.first().map(|o| o.number().0),
                 self.opaques.first().map(|o| o.number().0),
                 self.marker.then(|| opt::IF_NONE_MATCH.0)];

    let min = heads.iter().flatten().min().copied()?;

    if heads[0] == Some(min) {
      let o = &self.uints[0];
      self.uints = &self.uints[1..];
      Some((min, WireValue::uint(o.value)))
    } else if heads[1] == Some(min) {
      let o = &self.strings[0];
      self.strings = &self.strings[1..];
      Some((min, WireValue::Bytes(&o.value)))
    } else if heads[2] == Some(min) {
      let o = &self.opaques[0];
      self.opaques = &self.opaques[1..];
      Some((min, WireValue::Bytes(&o.value)))
    } else {
      self.marker = false;
      Some((min, WireValue::Marker))
    }
  }
}

impl<C, U, S, O> OptionTable<C, U, S, O>
  where C: Array<Item = u8>,
        U: Array<Item = UintOption>,
        S: Array<Item = StringOption<C>>,
        O: Array<Item = OpaqueOption<C>>
{
  pub(crate) fn wire(&self) -> WireOpts<'_, C> {
    WireOpts { uints: &self.uints,
               strings: &self.strings,
               opaques: &self.opaques,
               marker: self.if_none_match }
  }
}

/// Walk `opts` in wire order, synthesizing fenceposts, and hand every
/// emitted option (header byte, optional length-escape byte, value bytes)
/// to `f`. Returns how many option headers were emitted — the value the
/// 4-bit header option count must carry.
///
/// Both the size precomputation and the actual writer go through here,
/// which is what keeps them in exact agreement.
fn emit_opts<'a, C: Array<Item = u8>>(opts: WireOpts<'a, C>,
                                      mut f: impl FnMut(u8, Option<u8>, &[u8]))
                                      -> usize {
  let mut prev = 0u8;
  let mut count = 0usize;

  for (number, value) in opts {
    while number - prev > 15 {
      // zero-length fencepost advancing prev to its next multiple of 14
      let fence = (prev / FENCEPOST_BASE + 1) * FENCEPOST_BASE;
      f((fence - prev) << 4, None, &[]);
      prev = fence;
      count += 1;
    }

    let len = value.len();
    let (nib, escape) = match len {
      | n if n >= 15 => (15u8, Some((n - 15) as u8)),
      | n => (n as u8, None),
    };

    f(((number - prev) << 4) | nib, escape, value.as_slice());
    prev = number;
    count += 1;
  }

  count
}

impl<P, C, U, S, O> Message<P, C, U, S, O>
  where P: Array<Item = u8>,
        C: Array<Item = u8>,
        U: Array<Item = UintOption>,
        S: Array<Item = StringOption<C>>,
        O: Array<Item = OpaqueOption<C>>
{
  /// The exact number of bytes [`TryIntoBytes::try_into_bytes`] will
  /// produce for this message, without writing any of them.
  ///
  /// ```
  /// use peep_msg::{Code, Id, Token, TryIntoBytes, Type, VecMessage};
  ///
  /// let mut msg = VecMessage::new(Type::Con, Code::GET, Id(1));
  /// msg.opts.set_uri_path("temp").unwrap();
  ///
  /// let size = msg.wire_size();
  /// let bytes: Vec<u8> = msg.try_into_bytes().unwrap();
  /// assert_eq!(size, bytes.len());
  /// ```
  pub fn wire_size(&self) -> usize {
    let mut size = 4usize;
    emit_opts(self.opts.wire(), |_, escape, value| {
      size += 1 + usize::from(escape.is_some()) + value.len();
    });
    size + self.payload.0.len()
  }

  fn opt_count(&self) -> usize {
    emit_opts(self.opts.wire(), |_, _, _| ())
  }
}

impl<P, C, U, S, O> TryIntoBytes for Message<P, C, U, S, O>
  where P: Array<Item = u8>,
        C: Array<Item = u8>,
        U: Array<Item = UintOption>,
        S: Array<Item = StringOption<C>>,
        O: Array<Item = OpaqueOption<C>>
{
  type Error = MessageToBytesError;

  fn try_into_bytes<Bytes: Array<Item = u8>>(self) -> Result<Bytes, Self::Error> {
    let size = self.wire_size();
    let opt_count = self.opt_count();

    if opt_count > 15 {
      return Err(Self::Error::TooManyOptions(opt_count));
    }

    if let Some(max) = Bytes::CAPACITY {
      if max < size {
        return Err(Self::Error::TooLong { capacity: max,
                                          size });
      }
    }

    let mut bytes = Bytes::reserve(size);

    let byte1: u8 = Byte1 { ver: self.ver,
                            ty: self.ty,
                            opt_count: opt_count as u8 }.into();
    let code: u8 = self.code.into();
    let id: [u8; 2] = self.id.into();

    bytes.extend(Some(byte1));
    bytes.extend(Some(code));
    bytes.extend(id);

    emit_opts(self.opts.wire(), |header, escape, value| {
      bytes.extend(Some(header));
      bytes.extend(escape);
      bytes.extend(value.iter().copied());
    });

    bytes.extend(self.payload.0);

    Ok(bytes)
  }
}

impl From<Id> for [u8; 2] {
  fn from(id: Id) -> [u8; 2] {
    id.0.to_be_bytes()
  }
}

impl From<Type> for u8 {
  fn from(t: Type) -> u8 {
    use Type::*;
    match t {
      | Con => 0,
      | Non => 1,
      | Ack => 2,
      | Reset => 3,
    }
  }
}

impl From<Byte1> for u8 {
  fn from(b: Byte1) -> u8 {
    let ver = b.ver.0 << 6;
    let ty = u8::from(b.ty) << 4;

    ver | ty | (b.opt_count & 0b1111)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{assert_eqb, assert_eqb_iter};

  #[test]
  fn msg() {
    let (msg, expected) = crate::test_msg();
    let actual: Vec<u8> = msg.try_into_bytes().unwrap();
    assert_eqb_iter!(actual, expected);
  }

  #[test]
  fn byte_1() {
    let byte = Byte1 { ver: Version(1),
                       ty: Type::Ack,
                       opt_count: 3 };
    let actual: u8 = byte.into();
    let expected = 0b_01_10_0011u8;
    assert_eqb!(actual, expected)
  }

  #[test]
  fn minimal_packet_is_4_bytes() {
    let msg = VecMessage::new(Type::Non, Code::EMPTY, Id(0));
    assert_eq!(msg.wire_size(), 4);

    let bytes: Vec<u8> = msg.try_into_bytes().unwrap();
    assert_eq!(bytes, vec![0x50, 0x00, 0x00, 0x00]);
  }

  #[test]
  fn fencepost_bridges_the_gap_to_if_none_match() {
    let mut msg = VecMessage::new(Type::Non, Code::EMPTY, Id(0));
    msg.opts.set_if_none_match(true);

    assert_eq!(msg.wire_size(), 6);

    // option count 2: the fencepost at 14 counts, then delta 7 to 21
    let bytes: Vec<u8> = msg.try_into_bytes().unwrap();
    assert_eq!(bytes, vec![0x52, 0x00, 0x00, 0x00, 0xE0, 0x70]);
  }

  #[test]
  fn token_option_and_clearing_it() {
    let token = Token(tinyvec::array_vec!([u8; 8] => 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF1, 0x23, 0x45));

    let mut msg = VecMessage::new(Type::Non, Code::EMPTY, Id(0x1234));
    msg.opts.set_token(token).unwrap();

    assert_eq!(msg.wire_size(), 13);
    let bytes: Vec<u8> = msg.clone().try_into_bytes().unwrap();
    assert_eq!(bytes,
               vec![0x51, 0x00, 0x12, 0x34, 0xB8, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF1, 0x23, 0x45]);

    msg.opts.clear_token();
    let bytes: Vec<u8> = msg.try_into_bytes().unwrap();
    assert_eq!(bytes, vec![0x50, 0x00, 0x12, 0x34]);
  }

  #[test]
  fn length_escape_byte() {
    let mut msg = VecMessage::new(Type::Con, Code::GET, Id(0));
    msg.opts
       .set_string(opt::URI_HOST, core::str::from_utf8(&[b'a'; 20]).unwrap())
       .unwrap();

    let bytes: Vec<u8> = msg.clone().try_into_bytes().unwrap();
    // delta 5, length nibble 15, escape byte 20 - 15
    assert_eq!(&bytes[4..6], &[0x5F, 5]);
    assert_eq!(bytes.len(), msg.wire_size());
    assert_eq!(bytes.len(), 4 + 2 + 20);
  }

  #[test]
  fn uint_zero_is_zero_length() {
    let mut msg = VecMessage::new(Type::Con, Code::GET, Id(0));
    msg.opts.set_uint(opt::CONTENT_TYPE, 0).unwrap();

    let bytes: Vec<u8> = msg.try_into_bytes().unwrap();
    assert_eq!(bytes, vec![0x41, 0x01, 0x00, 0x00, 0x10]);
  }

  #[test]
  fn wire_size_agrees_for_assorted_messages() {
    let msgs: Vec<VecMessage> = {
      let mut with_everything = VecMessage::new(Type::Con, Code::GET, Id(77));
      with_everything.opts.set_uint(opt::CONTENT_TYPE, 40).unwrap();
      with_everything.opts.set_uri_path("a/bb/ccc").unwrap();
      with_everything.opts
                     .set_token(Token(tinyvec::array_vec!([u8; 8] => 1, 2)))
                     .unwrap();
      with_everything.opts.add_uint(opt::ACCEPT, 41).unwrap();
      with_everything.opts.set_if_none_match(true);
      with_everything.payload = Payload(b"payload".iter().copied().collect());

      let mut fencepost_then_payload = VecMessage::new(Type::Non, Code::CONTENT, Id(1));
      fencepost_then_payload.opts.set_if_none_match(true);
      fencepost_then_payload.payload = Payload(b"x".iter().copied().collect());

      vec![VecMessage::new(Type::Non, Code::EMPTY, Id(0)),
           crate::test_msg().0,
           with_everything,
           fencepost_then_payload]
    };

    for msg in msgs {
      let size = msg.wire_size();
      let bytes: Vec<u8> = msg.try_into_bytes().unwrap();
      assert_eq!(size, bytes.len());
    }
  }

  #[test]
  fn more_than_15_options_is_an_error() {
    let mut msg = VecMessage::new(Type::Con, Code::GET, Id(0));
    for _ in 0..16 {
      msg.opts.add_string(opt::URI_PATH, "x").unwrap();
    }

    assert_eq!(msg.try_into_bytes::<Vec<u8>>(),
               Err(MessageToBytesError::TooManyOptions(16)));
  }

  #[test]
  fn fixed_capacity_buffer_too_small() {
    let (msg, bytes) = crate::test_msg();
    assert_eq!(msg.try_into_bytes::<tinyvec::ArrayVec<[u8; 8]>>(),
               Err(MessageToBytesError::TooLong { capacity: 8,
                                                  size: bytes.len() }));
  }
}
