use embedded_time::duration::Milliseconds;

use crate::retry::{Attempts, Strategy};

/// Milliseconds, the only unit of time the engine thinks in.
pub type Millis = Milliseconds<u64>;

/// Configuration options related to outbound CONfirmable messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Con {
  /// Retry strategy for CON messages that
  /// have not yet been ACKed.
  ///
  /// The first retransmission delay is drawn uniformly from the
  /// strategy's window and doubles after every retransmission.
  ///
  /// Defaults to the draft's response timeout window:
  /// ```
  /// use embedded_time::duration::Milliseconds;
  /// use peep::config::Con;
  /// use peep::retry::Strategy;
  ///
  /// assert_eq!(Con::default().retry_strategy,
  ///            Strategy::Exponential { init_min: Milliseconds(2_000),
  ///                                    init_max: Milliseconds(3_000) });
  /// ```
  pub retry_strategy: Strategy,
  /// Number of times we are allowed to transmit a CON message
  /// before giving the exchange up.
  ///
  /// Defaults to 4 attempts.
  /// ```
  /// use peep::config::Con;
  /// use peep::retry::Attempts;
  ///
  /// assert_eq!(Con::default().max_attempts, Attempts(4));
  /// ```
  pub max_attempts: Attempts,
}

impl Default for Con {
  fn default() -> Self {
    Con { retry_strategy: Strategy::Exponential { init_min: Milliseconds(2_000),
                                                  init_max: Milliseconds(3_000) },
          max_attempts: Attempts(4) }
  }
}

/// Runtime config
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Config {
  /// See [`Con`]
  pub con: Con,
  /// Grace period between receiving a CON request and acknowledging it
  /// with a bare ACK when the application has not replied yet.
  ///
  /// A reply arriving inside this window rides along with the ACK
  /// ("piggybacked") and costs one message instead of two. The window
  /// must stay comfortably under the peer's minimum retransmission
  /// delay or every request gets sent twice.
  ///
  /// Defaults to 1500 milliseconds.
  ///
  /// ```
  /// use embedded_time::duration::Milliseconds;
  /// use peep::config::Config;
  ///
  /// assert_eq!(Config::default().ack_delay, Milliseconds(1_500u64));
  /// ```
  pub ack_delay: Millis,
}

impl Default for Config {
  fn default() -> Self {
    Config { con: Con::default(),
             ack_delay: Milliseconds(1_500) }
  }
}
