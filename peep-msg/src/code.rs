#[cfg(feature = "alloc")]
use std_alloc::string::{String, ToString};

/// # Message Code
///
/// The code is a single byte split into a 3-bit class and 5-bit detail,
/// read as `class.detail` (e.g. code 69 is `2.05` Content).
///
/// | numeric range | meaning                 |
/// |---------------|-------------------------|
/// | `0`           | empty (bare ACK / RST)  |
/// | `1..=31`      | request method          |
/// | `64..=191`    | response status         |
/// | anything else | reserved                |
///
/// # Examples
/// ```
/// use peep_msg::Code;
/// assert_eq!(Code { class: 2, detail: 5 }.to_string(), "2.05".to_string())
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Code {
  /// The "class" of message codes identify it as a request or response, and provides the class of response status:
  ///
  /// |class|meaning|
  /// |---|---|
  /// |`0`|Message is a request (or empty when detail is also 0)|
  /// |`2`|Message is a success response|
  /// |`4`|Message is a client error response|
  /// |`5`|Message is a server error response|
  pub class: u8,

  /// 5-bit integer (range `[0, 32)`) that provides granular information about the response status.
  pub detail: u8,
}

/// The 3 categories a valid [`Code`] can fall into, plus a bucket for
/// everything the draft reserves.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum CodeKind {
  /// Code 0; carries no request or response, e.g. a bare ACK
  Empty,
  /// Codes 1-31
  Request,
  /// Codes 64-191
  Response,
  /// Every other code
  Reserved,
}

impl Code {
  /// Create a new Code
  ///
  /// ```
  /// use peep_msg::Code;
  ///
  /// let content = Code::new(2, 05);
  /// ```
  pub const fn new(class: u8, detail: u8) -> Self {
    Self { class, detail }
  }

  /// 0.00; no request or response
  pub const EMPTY: Code = Code::new(0, 0);
  /// 0.01
  pub const GET: Code = Code::new(0, 1);
  /// 0.02
  pub const POST: Code = Code::new(0, 2);
  /// 0.03
  pub const PUT: Code = Code::new(0, 3);
  /// 0.04
  pub const DELETE: Code = Code::new(0, 4);
  /// 2.01 (65)
  pub const CREATED: Code = Code::new(2, 1);
  /// 2.02 (66)
  pub const DELETED: Code = Code::new(2, 2);
  /// 2.03 (67)
  pub const VALID: Code = Code::new(2, 3);
  /// 2.04 (68)
  pub const CHANGED: Code = Code::new(2, 4);
  /// 2.05 (69)
  pub const CONTENT: Code = Code::new(2, 5);
  /// 4.00 (128)
  pub const BAD_REQUEST: Code = Code::new(4, 0);
  /// 4.01 (129)
  pub const UNAUTHORIZED: Code = Code::new(4, 1);
  /// 4.02 (130)
  pub const BAD_OPTION: Code = Code::new(4, 2);
  /// 4.03 (131)
  pub const FORBIDDEN: Code = Code::new(4, 3);
  /// 4.04 (132)
  pub const NOT_FOUND: Code = Code::new(4, 4);
  /// 4.05 (133)
  pub const METHOD_NOT_ALLOWED: Code = Code::new(4, 5);
  /// 4.12 (140)
  pub const PRECONDITION_FAILED: Code = Code::new(4, 12);
  /// 4.13 (141)
  pub const REQUEST_ENTITY_TOO_LARGE: Code = Code::new(4, 13);
  /// 5.00 (160)
  pub const INTERNAL_SERVER_ERROR: Code = Code::new(5, 0);
  /// 5.01 (161)
  pub const NOT_IMPLEMENTED: Code = Code::new(5, 1);
  /// 5.02 (162)
  pub const BAD_GATEWAY: Code = Code::new(5, 2);
  /// 5.03 (163)
  pub const SERVICE_UNAVAILABLE: Code = Code::new(5, 3);
  /// 5.04 (164)
  pub const GATEWAY_TIMEOUT: Code = Code::new(5, 4);
  /// 5.05 (165)
  pub const PROXYING_NOT_SUPPORTED: Code = Code::new(5, 5);

  /// Whether this code is a request, response, or empty.
  ///
  /// Exactly one of the three holds for any valid code; everything
  /// else is [`CodeKind::Reserved`].
  ///
  /// ```
  /// use peep_msg::{Code, CodeKind};
  ///
  /// assert_eq!(Code::EMPTY.kind(), CodeKind::Empty);
  /// assert_eq!(Code::GET.kind(), CodeKind::Request);
  /// assert_eq!(Code::NOT_FOUND.kind(), CodeKind::Response);
  /// assert_eq!(Code::new(1, 0).kind(), CodeKind::Reserved);
  /// ```
  pub fn kind(&self) -> CodeKind {
    match u8::from(*self) {
      | 0 => CodeKind::Empty,
      | 1..=31 => CodeKind::Request,
      | 64..=191 => CodeKind::Response,
      | _ => CodeKind::Reserved,
    }
  }

  /// Get the human string representation of a message code
  ///
  /// # Returns
  /// A `char` array
  ///
  /// This is to avoid unnecessary heap allocation,
  /// you can create a `String` with `FromIterator::<String>::from_iter`,
  /// or if the `alloc` feature is enabled there is a `ToString` implementation provided for Code.
  /// ```
  /// use peep_msg::Code;
  ///
  /// let code = Code { class: 2, detail: 5 };
  /// let chars = code.to_human();
  /// let string = String::from_iter(chars);
  /// assert_eq!(string, "2.05".to_string());
  /// ```
  pub fn to_human(&self) -> [char; 4] {
    let to_char = |d: u8| char::from_digit(d.into(), 10).unwrap_or('?');
    [to_char(self.class),
     '.',
     to_char(self.detail / 10),
     to_char(self.detail % 10)]
  }
}

#[cfg(feature = "alloc")]
impl ToString for Code {
  fn to_string(&self) -> String {
    String::from_iter(self.to_human())
  }
}

impl From<u8> for Code {
  fn from(b: u8) -> Self {
    let class = b >> 5;
    let detail = b & 0b0011111;

    Code { class, detail }
  }
}

impl From<Code> for u8 {
  fn from(code: Code) -> u8 {
    let class = code.class << 5;
    let detail = code.detail;

    class | detail
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::assert_eqb;

  #[test]
  fn parse_code() {
    let byte = 0b_01_000101u8;
    let code = Code::from(byte);
    assert_eq!(code, Code { class: 2, detail: 5 })
  }

  #[test]
  fn serialize_code() {
    let code = Code { class: 2, detail: 5 };
    let actual: u8 = code.into();
    let expected = 0b_010_00101u8;
    assert_eqb!(actual, expected)
  }

  #[test]
  fn code_space_boundaries() {
    assert_eq!(u8::from(Code::GET), 1);
    assert_eq!(u8::from(Code::DELETE), 4);
    assert_eq!(u8::from(Code::CREATED), 65);
    assert_eq!(u8::from(Code::CONTENT), 69);
    assert_eq!(u8::from(Code::BAD_REQUEST), 128);
    assert_eq!(u8::from(Code::REQUEST_ENTITY_TOO_LARGE), 141);
    assert_eq!(u8::from(Code::INTERNAL_SERVER_ERROR), 160);
    assert_eq!(u8::from(Code::PROXYING_NOT_SUPPORTED), 165);
  }

  #[test]
  fn kind_partitions_the_byte() {
    let kinds = (0u8..=255).map(Code::from)
                           .map(|c| c.kind())
                           .collect::<Vec<_>>();

    assert_eq!(kinds.iter().filter(|k| **k == CodeKind::Empty).count(), 1);
    assert_eq!(kinds.iter().filter(|k| **k == CodeKind::Request).count(), 31);
    assert_eq!(kinds.iter().filter(|k| **k == CodeKind::Response).count(), 128);
  }
}
