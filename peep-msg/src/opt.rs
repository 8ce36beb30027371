use core::marker::PhantomData;

#[cfg(feature = "alloc")]
use std_alloc::string::String;
#[cfg(feature = "alloc")]
use std_alloc::vec::Vec;
use toad_array::{AppendCopy, Array};
use toad_len::Len;

use crate::Token;

/// The number identifying what an option *means*
/// (e.g. Uri-Path is number 9).
///
/// Unlike later protocol revisions there is no extended-delta encoding;
/// numbers live in `0..=255` and only those in the [registry](lookup)
/// are meaningful.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct OptNumber(pub u8);

/// Content-Type (uint, max 2 bytes)
pub const CONTENT_TYPE: OptNumber = OptNumber(1);
/// Max-Age (uint, max 4 bytes)
pub const MAX_AGE: OptNumber = OptNumber(2);
/// Proxy-Uri (string, max 270 bytes)
pub const PROXY_URI: OptNumber = OptNumber(3);
/// ETag (opaque, max 8 bytes, repeatable)
pub const ETAG: OptNumber = OptNumber(4);
/// Uri-Host (string, max 270 bytes)
pub const URI_HOST: OptNumber = OptNumber(5);
/// Location-Path (string, max 270 bytes, repeatable)
pub const LOCATION_PATH: OptNumber = OptNumber(6);
/// Uri-Port (uint, max 2 bytes)
pub const URI_PORT: OptNumber = OptNumber(7);
/// Location-Query (string, max 270 bytes, repeatable)
pub const LOCATION_QUERY: OptNumber = OptNumber(8);
/// Uri-Path (string, max 270 bytes, repeatable); one option per path segment
pub const URI_PATH: OptNumber = OptNumber(9);
/// Token (opaque, max 8 bytes); see [`Token`]
pub const TOKEN: OptNumber = OptNumber(11);
/// Accept (uint, max 2 bytes, repeatable)
pub const ACCEPT: OptNumber = OptNumber(12);
/// If-Match (opaque, max 8 bytes, repeatable)
pub const IF_MATCH: OptNumber = OptNumber(13);
/// Fencepost (no value); never stored, synthesized during serialization
/// whenever the gap to the next real option exceeds 15
pub const FENCEPOST: OptNumber = OptNumber(14);
/// Uri-Query (string, max 270 bytes, repeatable)
pub const URI_QUERY: OptNumber = OptNumber(15);
/// If-None-Match (no value)
pub const IF_NONE_MATCH: OptNumber = OptNumber(21);

/// Fencepost numbers are the multiples of this base.
pub(crate) const FENCEPOST_BASE: u8 = 14;

/// The shape an option's value must take.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum OptFormat {
  /// Variable-length big-endian unsigned integer, leading zero bytes
  /// elided (zero is zero-length)
  Uint,
  /// UTF-8 text
  String,
  /// Raw bytes
  Opaque,
  /// No value at all; the option's presence is the information
  Marker,
}

/// What the registry knows about an option number.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct OptionMeta {
  /// See [`OptFormat`]
  pub format: OptFormat,
  /// Longest permitted value, in encoded bytes
  pub max_len: usize,
  /// May this option occur more than once in a message?
  pub repeatable: bool,
}

/// Look an option number up in the static registry.
///
/// `None` means the number is unknown to this draft revision;
/// mutators reject it and the parser skips it.
pub fn lookup(OptNumber(n): OptNumber) -> Option<OptionMeta> {
  use OptFormat::*;

  let meta = |format, max_len, repeatable| {
    Some(OptionMeta { format,
                      max_len,
                      repeatable })
  };

  match n {
    | 1 => meta(Uint, 2, false),
    | 2 => meta(Uint, 4, false),
    | 3 => meta(String, 270, false),
    | 4 => meta(Opaque, 8, true),
    | 5 => meta(String, 270, false),
    | 6 => meta(String, 270, true),
    | 7 => meta(Uint, 2, false),
    | 8 => meta(String, 270, true),
    | 9 => meta(String, 270, true),
    | 11 => meta(Opaque, 8, false),
    | 12 => meta(Uint, 2, true),
    | 13 => meta(Opaque, 8, true),
    | 14 => meta(Marker, 0, true),
    | 15 => meta(String, 270, true),
    | 21 => meta(Marker, 0, false),
    | _ => None,
  }
}

/// Errors yielded by [`OptionTable`] mutators & accessors
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum OptionError {
  /// The number is not in the [registry](lookup)
  Unknown(OptNumber),
  /// The number is registered with a different [`OptFormat`]
  /// than the method invoked
  WrongType {
    /// the offending number
    number: OptNumber,
    /// the format the registry declares for it
    expected: OptFormat,
  },
  /// Read of an option that is not present in the table
  NotSet(OptNumber),
  /// The value is longer than the registry (or the backing
  /// collection) permits
  TooLong {
    /// the offending number
    number: OptNumber,
    /// longest permitted value in bytes
    max: usize,
    /// what was actually provided
    actual: usize,
  },
  /// The typed sub-collection for this format has no room left
  Full(OptNumber),
}

/// An integer-valued option
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct UintOption {
  /// See [`OptNumber`]
  pub number: OptNumber,
  /// The decoded integer
  pub value: u32,
}

/// A text-valued option
///
/// Invariant: `value` is always valid UTF-8 (enforced on set & on parse).
#[derive(Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct StringOption<C: Array<Item = u8>> {
  /// See [`OptNumber`]
  pub number: OptNumber,
  /// The text, stored as bytes
  pub value: C,
}

/// A raw-bytes option
#[derive(Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct OpaqueOption<C: Array<Item = u8>> {
  /// See [`OptNumber`]
  pub number: OptNumber,
  /// The bytes
  pub value: C,
}

/// # `OptionTable` struct
/// A typed, sorted, multi-valued collection of the options in one message.
///
/// Values live in three independent bounded sub-collections (one per
/// [`OptFormat`], the marker being a plain flag), each kept sorted by
/// option number so that serialization can merge them into one strictly
/// ascending run. The registry dictates which numbers are legal, what
/// format their values take, and whether they may repeat.
///
/// ```
/// use peep_msg::opt;
/// use peep_msg::{OptionError, VecTable};
///
/// let mut opts = VecTable::default();
/// opts.add_string(opt::URI_PATH, "storage").unwrap();
/// opts.add_string(opt::URI_PATH, "mote1").unwrap();
/// opts.set_uint(opt::CONTENT_TYPE, 0).unwrap();
///
/// assert_eq!(opts.get_string(opt::URI_PATH), Ok("storage"));
/// assert_eq!(opts.get_uint(opt::MAX_AGE),
///            Err(OptionError::NotSet(opt::MAX_AGE)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct OptionTable<C, U, S, O>
  where C: Array<Item = u8>,
        U: Array<Item = UintOption>,
        S: Array<Item = StringOption<C>>,
        O: Array<Item = OpaqueOption<C>>
{
  pub(crate) uints: U,
  pub(crate) strings: S,
  pub(crate) opaques: O,
  pub(crate) if_none_match: bool,
  __valc: PhantomData<C>,
}

/// OptionTable that uses Vec collections
#[cfg(feature = "alloc")]
pub type VecTable =
  OptionTable<Vec<u8>, Vec<UintOption>, Vec<StringOption<Vec<u8>>>, Vec<OpaqueOption<Vec<u8>>>>;

impl<C, U, S, O> Default for OptionTable<C, U, S, O>
  where C: Array<Item = u8>,
        U: Array<Item = UintOption>,
        S: Array<Item = StringOption<C>>,
        O: Array<Item = OpaqueOption<C>>
{
  fn default() -> Self {
    Self { uints: U::default(),
           strings: S::default(),
           opaques: O::default(),
           if_none_match: false,
           __valc: PhantomData }
  }
}

fn check<const FORMAT_IS: u8>(number: OptNumber) -> Result<OptionMeta, OptionError> {
  let meta = lookup(number).ok_or(OptionError::Unknown(number))?;
  let format = match FORMAT_IS {
    | 0 => OptFormat::Uint,
    | 1 => OptFormat::String,
    | 2 => OptFormat::Opaque,
    | _ => OptFormat::Marker,
  };

  if meta.format != format {
    Err(OptionError::WrongType { number,
                                 expected: meta.format })
  } else {
    Ok(meta)
  }
}

/// Number of big-endian bytes needed for `v` with leading zeroes elided.
pub(crate) fn uint_len(v: u32) -> usize {
  4 - (v.leading_zeros() / 8) as usize
}

fn copy_value<C: Array<Item = u8> + AppendCopy<u8>>(number: OptNumber,
                                                    max: usize,
                                                    bytes: &[u8])
                                                    -> Result<C, OptionError> {
  let cap = C::CAPACITY.unwrap_or(usize::MAX).min(max);

  if bytes.len() > cap {
    return Err(OptionError::TooLong { number,
                                      max: cap,
                                      actual: bytes.len() });
  }

  let mut c = C::reserve(bytes.len());
  c.append_copy(bytes);
  Ok(c)
}

impl<C, U, S, O> OptionTable<C, U, S, O>
  where C: Array<Item = u8> + AppendCopy<u8>,
        U: Array<Item = UintOption>,
        S: Array<Item = StringOption<C>>,
        O: Array<Item = OpaqueOption<C>>
{
  /// Total number of options in the table, the If-None-Match marker
  /// included. (Fenceposts are not stored and not counted.)
  pub fn count(&self) -> usize {
    self.uints.len() + self.strings.len() + self.opaques.len() + usize::from(self.if_none_match)
  }

  /// Set an integer option, replacing every existing value of `number`.
  pub fn set_uint(&mut self, number: OptNumber, value: u32) -> Result<(), OptionError> {
    let meta = check::<0>(number)?;

    if uint_len(value) > meta.max_len {
      return Err(OptionError::TooLong { number,
                                        max: meta.max_len,
                                        actual: uint_len(value) });
    }

    Self::set_in(&mut self.uints, number, UintOption { number, value })
  }

  /// Append an integer option, keeping the collection sorted.
  ///
  /// For non-repeatable numbers this replaces instead of appending.
  pub fn add_uint(&mut self, number: OptNumber, value: u32) -> Result<(), OptionError> {
    let meta = check::<0>(number)?;

    if uint_len(value) > meta.max_len {
      return Err(OptionError::TooLong { number,
                                        max: meta.max_len,
                                        actual: uint_len(value) });
    }

    if meta.repeatable {
      Self::add_in(&mut self.uints, number, UintOption { number, value })
    } else {
      Self::set_in(&mut self.uints, number, UintOption { number, value })
    }
  }

  /// Set a text option, replacing every existing value of `number`.
  pub fn set_string(&mut self, number: OptNumber, value: &str) -> Result<(), OptionError> {
    let meta = check::<1>(number)?;
    let value = copy_value(number, meta.max_len, value.as_bytes())?;
    Self::set_in(&mut self.strings, number, StringOption { number, value })
  }

  /// Append a text option, keeping the collection sorted. Values of the
  /// same number stay in insertion order.
  ///
  /// For non-repeatable numbers this replaces instead of appending.
  pub fn add_string(&mut self, number: OptNumber, value: &str) -> Result<(), OptionError> {
    let meta = check::<1>(number)?;
    let value = copy_value(number, meta.max_len, value.as_bytes())?;

    if meta.repeatable {
      Self::add_in(&mut self.strings, number, StringOption { number, value })
    } else {
      Self::set_in(&mut self.strings, number, StringOption { number, value })
    }
  }

  /// Set a raw-bytes option, replacing every existing value of `number`.
  pub fn set_opaque(&mut self, number: OptNumber, value: &[u8]) -> Result<(), OptionError> {
    let meta = check::<2>(number)?;
    let value = copy_value(number, meta.max_len, value)?;
    Self::set_in(&mut self.opaques, number, OpaqueOption { number, value })
  }

  /// Append a raw-bytes option, keeping the collection sorted.
  ///
  /// For non-repeatable numbers this replaces instead of appending.
  pub fn add_opaque(&mut self, number: OptNumber, value: &[u8]) -> Result<(), OptionError> {
    let meta = check::<2>(number)?;
    let value = copy_value(number, meta.max_len, value)?;

    if meta.repeatable {
      Self::add_in(&mut self.opaques, number, OpaqueOption { number, value })
    } else {
      Self::set_in(&mut self.opaques, number, OpaqueOption { number, value })
    }
  }

  /// Raise or lower the If-None-Match marker.
  pub fn set_if_none_match(&mut self, value: bool) {
    self.if_none_match = value;
  }

  /// Is the If-None-Match marker present?
  pub fn if_none_match(&self) -> bool {
    self.if_none_match
  }

  /// Delete every value of `number`, whatever its format.
  pub fn remove(&mut self, number: OptNumber) -> Result<(), OptionError> {
    let meta = lookup(number).ok_or(OptionError::Unknown(number))?;

    match meta.format {
      | OptFormat::Uint => Self::remove_in(&mut self.uints, |o| o.number == number),
      | OptFormat::String => Self::remove_in(&mut self.strings, |o| o.number == number),
      | OptFormat::Opaque => Self::remove_in(&mut self.opaques, |o| o.number == number),
      | OptFormat::Marker => self.if_none_match = false,
    }

    Ok(())
  }

  /// Read the first (or only) integer value of `number`.
  pub fn get_uint(&self, number: OptNumber) -> Result<u32, OptionError> {
    check::<0>(number)?;
    self.uints
        .iter()
        .find(|o| o.number == number)
        .map(|o| o.value)
        .ok_or(OptionError::NotSet(number))
  }

  /// Read the first (or only) text value of `number`.
  pub fn get_string(&self, number: OptNumber) -> Result<&str, OptionError> {
    check::<1>(number)?;
    self.strings
        .iter()
        .find(|o| o.number == number)
        .ok_or(OptionError::NotSet(number))
        .and_then(|o| {
          core::str::from_utf8(&o.value).map_err(|_| OptionError::WrongType { number,
                                                                              expected:
                                                                                OptFormat::String })
        })
  }

  /// Read the first (or only) raw-bytes value of `number`.
  pub fn get_opaque(&self, number: OptNumber) -> Result<&[u8], OptionError> {
    check::<2>(number)?;
    self.opaques
        .iter()
        .find(|o| o.number == number)
        .map(|o| &o.value[..])
        .ok_or(OptionError::NotSet(number))
  }

  /// Every integer value of `number`, in insertion order.
  pub fn get_all_uints(&self, number: OptNumber) -> impl Iterator<Item = u32> + '_ {
    self.uints
        .iter()
        .filter(move |o| o.number == number)
        .map(|o| o.value)
  }

  /// Every text value of `number`, in insertion order.
  pub fn get_all_strings(&self, number: OptNumber) -> impl Iterator<Item = &str> + '_ {
    self.strings
        .iter()
        .filter(move |o| o.number == number)
        .filter_map(|o| core::str::from_utf8(&o.value).ok())
  }

  /// Every raw-bytes value of `number`, in insertion order.
  pub fn get_all_opaques(&self, number: OptNumber) -> impl Iterator<Item = &[u8]> + '_ {
    self.opaques
        .iter()
        .filter(move |o| o.number == number)
        .map(|o| &o.value[..])
  }

  /// The [`Token`] correlating this message to an exchange, if any.
  pub fn token(&self) -> Option<Token> {
    self.get_opaque(TOKEN)
        .ok()
        .map(|bytes| Token(bytes.iter().copied().collect()))
  }

  /// Set the [`Token`] option.
  pub fn set_token(&mut self, token: Token) -> Result<(), OptionError> {
    self.set_opaque(TOKEN, &token.0)
  }

  /// Remove the [`Token`] option.
  pub fn clear_token(&mut self) {
    // TOKEN is registered, remove can't fail
    self.remove(TOKEN).ok();
  }

  /// The request path: every Uri-Path segment joined with `/`.
  ///
  /// ```
  /// use peep_msg::opt;
  /// use peep_msg::VecTable;
  ///
  /// let mut opts = VecTable::default();
  /// opts.add_string(opt::URI_PATH, "storage").unwrap();
  /// opts.add_string(opt::URI_PATH, "mote1").unwrap();
  /// assert_eq!(opts.uri_path(), "storage/mote1");
  /// ```
  #[cfg(feature = "alloc")]
  #[cfg_attr(docsrs, doc(cfg(feature = "alloc")))]
  pub fn uri_path(&self) -> String {
    let mut path = String::new();
    for seg in self.get_all_strings(URI_PATH) {
      if !path.is_empty() {
        path.push('/');
      }
      path.push_str(seg);
    }
    path
  }

  /// Split `path` on `/` and add one Uri-Path option per non-empty segment.
  pub fn set_uri_path(&mut self, path: &str) -> Result<(), OptionError> {
    self.remove(URI_PATH)?;
    path.split('/')
        .filter(|seg| !seg.is_empty())
        .try_for_each(|seg| self.add_string(URI_PATH, seg))
  }

  /// Store an option parsed off the wire, dispatching on the registry.
  ///
  /// Unknown numbers, unparseable values and fenceposts are silently
  /// skipped for forward compatibility; only a full sub-collection is
  /// an error.
  pub(crate) fn decode_push(&mut self,
                            number: OptNumber,
                            bytes: &[u8])
                            -> Result<(), OptionError> {
    let meta = match lookup(number) {
      | Some(meta) => meta,
      | None => return Ok(()),
    };

    match meta.format {
      | OptFormat::Marker => {
        // peers may send a redundant zero-length-value byte; the flag is
        // the information, the value is dropped
        if number == IF_NONE_MATCH {
          self.if_none_match = true;
        }
        Ok(())
      },
      | _ if bytes.len() > meta.max_len => Ok(()),
      | OptFormat::Uint => {
        let value = bytes.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32);
        let opt = UintOption { number, value };
        if meta.repeatable {
          Self::add_in(&mut self.uints, number, opt)
        } else {
          Self::set_in(&mut self.uints, number, opt)
        }
      },
      | OptFormat::String if core::str::from_utf8(bytes).is_err() => Ok(()),
      | OptFormat::String => {
        let value = copy_value(number, meta.max_len, bytes)?;
        let opt = StringOption { number, value };
        if meta.repeatable {
          Self::add_in(&mut self.strings, number, opt)
        } else {
          Self::set_in(&mut self.strings, number, opt)
        }
      },
      | OptFormat::Opaque => {
        let value = copy_value(number, meta.max_len, bytes)?;
        let opt = OpaqueOption { number, value };
        if meta.repeatable {
          Self::add_in(&mut self.opaques, number, opt)
        } else {
          Self::set_in(&mut self.opaques, number, opt)
        }
      },
    }
  }

  fn set_in<T>(list: &mut T, number: OptNumber, value: <T as Array>::Item) -> Result<(), OptionError>
    where T: Array,
          <T as Array>::Item: HasNumber
  {
    Self::remove_in(list, |o| o.number() == number);
    Self::add_in(list, number, value)
  }

  fn add_in<T>(list: &mut T, number: OptNumber, value: <T as Array>::Item) -> Result<(), OptionError>
    where T: Array,
          <T as Array>::Item: HasNumber
  {
    if list.is_full() {
      return Err(OptionError::Full(number));
    }

    // insert after the last entry with a number <= ours so same-number
    // runs keep insertion order
    let ix = list.iter()
                 .position(|o| o.number() > number)
                 .unwrap_or(list.len());
    list.insert(ix, value);
    Ok(())
  }

  fn remove_in<T>(list: &mut T, mut matches: impl FnMut(&<T as Array>::Item) -> bool)
    where T: Array,
          <T as Array>::Item: HasNumber
  {
    while let Some(ix) = list.iter().position(|o| matches(o)) {
      list.remove(ix);
    }
  }
}

/// Lets the sorted-insert machinery treat the three typed options uniformly.
pub(crate) trait HasNumber {
  fn number(&self) -> OptNumber;
}

impl HasNumber for UintOption {
  fn number(&self) -> OptNumber {
    self.number
  }
}

impl<C: Array<Item = u8>> HasNumber for StringOption<C> {
  fn number(&self) -> OptNumber {
    self.number
  }
}

impl<C: Array<Item = u8>> HasNumber for OpaqueOption<C> {
  fn number(&self) -> OptNumber {
    self.number
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::VecTable;

  #[test]
  fn set_overwrites_add_appends() {
    let mut opts = VecTable::default();
    opts.set_uint(CONTENT_TYPE, 40).unwrap();
    opts.set_uint(CONTENT_TYPE, 41).unwrap();
    assert_eq!(opts.get_uint(CONTENT_TYPE), Ok(41));
    assert_eq!(opts.count(), 1);

    opts.add_string(URI_PATH, "a").unwrap();
    opts.add_string(URI_PATH, "b").unwrap();
    assert_eq!(opts.get_all_strings(URI_PATH).collect::<Vec<_>>(),
               vec!["a", "b"]);
    assert_eq!(opts.count(), 3);
  }

  #[test]
  fn add_on_single_valued_overwrites() {
    let mut opts = VecTable::default();
    opts.add_string(URI_HOST, "mote1").unwrap();
    opts.add_string(URI_HOST, "mote2").unwrap();
    assert_eq!(opts.get_string(URI_HOST), Ok("mote2"));
    assert_eq!(opts.count(), 1);
  }

  #[test]
  fn unknown_number_rejected() {
    let mut opts = VecTable::default();
    assert_eq!(opts.set_uint(OptNumber(22), 1),
               Err(OptionError::Unknown(OptNumber(22))));
    assert_eq!(opts.set_uint(OptNumber(10), 1),
               Err(OptionError::Unknown(OptNumber(10))));
  }

  #[test]
  fn wrong_format_rejected() {
    let mut opts = VecTable::default();
    assert_eq!(opts.set_uint(URI_PATH, 1),
               Err(OptionError::WrongType { number: URI_PATH,
                                            expected: OptFormat::String }));
    assert_eq!(opts.set_string(CONTENT_TYPE, "text/plain"),
               Err(OptionError::WrongType { number: CONTENT_TYPE,
                                            expected: OptFormat::Uint }));
  }

  #[test]
  fn get_absent_is_not_set() {
    let opts = VecTable::default();
    assert_eq!(opts.get_opaque(ETAG), Err(OptionError::NotSet(ETAG)));
  }

  #[test]
  fn too_long_rejected() {
    let mut opts = VecTable::default();
    assert_eq!(opts.set_opaque(TOKEN, &[0u8; 9]),
               Err(OptionError::TooLong { number: TOKEN,
                                          max: 8,
                                          actual: 9 }));
    assert_eq!(opts.set_uint(CONTENT_TYPE, 0x1_0000),
               Err(OptionError::TooLong { number: CONTENT_TYPE,
                                          max: 2,
                                          actual: 3 }));
  }

  #[test]
  fn fixed_capacity_table_fills_up() {
    type SmallTable = OptionTable<tinyvec::ArrayVec<[u8; 16]>,
                                  tinyvec::ArrayVec<[UintOption; 1]>,
                                  tinyvec::ArrayVec<[StringOption<tinyvec::ArrayVec<[u8; 16]>>; 2]>,
                                  tinyvec::ArrayVec<[OpaqueOption<tinyvec::ArrayVec<[u8; 16]>>; 1]>>;

    let mut opts = SmallTable::default();
    opts.add_string(URI_PATH, "a").unwrap();
    opts.add_string(URI_PATH, "b").unwrap();
    assert_eq!(opts.add_string(URI_PATH, "c"),
               Err(OptionError::Full(URI_PATH)));

    // overwriting when full is fine, the slot is reused
    opts.set_uint(CONTENT_TYPE, 1).unwrap();
    opts.set_uint(CONTENT_TYPE, 2).unwrap();
    assert_eq!(opts.get_uint(CONTENT_TYPE), Ok(2));
  }

  #[test]
  fn remove_deletes_every_value() {
    let mut opts = VecTable::default();
    opts.add_string(URI_PATH, "a").unwrap();
    opts.add_string(URI_PATH, "b").unwrap();
    opts.set_if_none_match(true);

    opts.remove(URI_PATH).unwrap();
    assert_eq!(opts.get_all_strings(URI_PATH).count(), 0);

    opts.remove(IF_NONE_MATCH).unwrap();
    assert!(!opts.if_none_match());
  }

  #[test]
  fn uri_path_round_trip() {
    let mut opts = VecTable::default();
    opts.set_uri_path("storage/KAESEKUCHEN").unwrap();
    assert_eq!(opts.uri_path(), "storage/KAESEKUCHEN");

    opts.set_uri_path("/leading/slash/").unwrap();
    assert_eq!(opts.uri_path(), "leading/slash");
  }

  #[test]
  fn uint_len_is_minimal() {
    assert_eq!(uint_len(0), 0);
    assert_eq!(uint_len(0xFF), 1);
    assert_eq!(uint_len(0x100), 2);
    assert_eq!(uint_len(0xFFFF_FFFF), 4);
  }
}
