use core::ops::RangeInclusive;

use embedded_time::duration::Milliseconds;
use rand::Rng;

use crate::config::Millis;

/// A number of attempts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Attempts(pub u16);

/// Strategy to employ when retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strategy {
  /// Draw a random delay between `init_min` and `init_max` for the first
  /// retransmission, then double the delay after each one.
  Exponential {
    /// Minimum (inclusive) delay before the first retransmission
    init_min: Millis,
    /// Maximum (inclusive) delay before the first retransmission
    init_max: Millis,
  },
}

impl Strategy {
  /// Are min & max delays the same? if so, we should probably skip the
  /// random number generation.
  pub fn has_jitter(&self) -> bool {
    let rng = self.range();
    rng.start() != rng.end()
  }

  /// Get the min & max durations as an inclusive range
  pub fn range(&self) -> RangeInclusive<u64> {
    match self {
      | &Self::Exponential { init_min: Milliseconds(min),
                             init_max: Milliseconds(max), } => (min..=max),
    }
  }
}

/// Result of [`Backoff::what_should_i_do`].
///
/// This tells you if a retransmission should be attempted or not.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum YouShould {
  /// A retransmission should be performed, and the next timer armed
  /// with the carried delay.
  Retry(Millis),
  /// Attempts have been exhausted and the exchange that is
  /// being retried should be considered poisoned.
  Cry,
}

/// Backoff bookkeeping that lives alongside one journaled confirmable
/// message.
///
/// It does not _contain_ the work to be done (e.g. `Box<fn()>`) and it
/// does not watch a clock; the host's timer does the waiting, this only
/// answers "and now what?" each time the timer fires.
///
/// ```
/// use embedded_time::duration::Milliseconds;
/// use peep::retry::{Attempts, Backoff, Strategy, YouShould};
/// use rand::SeedableRng;
///
/// let mut rand = rand_chacha::ChaCha8Rng::seed_from_u64(42);
/// let strategy = Strategy::Exponential { init_min: Milliseconds(100),
///                                        init_max: Milliseconds(200) };
/// let mut backoff = Backoff::new(strategy, Attempts(2), &mut rand);
///
/// let first = backoff.first_delay();
/// assert!((100..=200).contains(&first.0));
///
/// // the timer fired without an ACK: resend once, then give up
/// assert_eq!(backoff.what_should_i_do(),
///            YouShould::Retry(Milliseconds(first.0 * 2)));
/// assert_eq!(backoff.what_should_i_do(), YouShould::Cry);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
  next_delay: Millis,
  attempts: Attempts,
  max_attempts: Attempts,
}

impl Backoff {
  /// Create backoff state for a message that was just transmitted
  /// (attempt #1), drawing the initial delay from `rand` within the
  /// strategy's window.
  pub fn new(strategy: Strategy, max_attempts: Attempts, rand: &mut impl Rng) -> Self {
    let init = if strategy.has_jitter() {
      rand.gen_range(strategy.range())
    } else {
      *strategy.range().start()
    };

    Self { next_delay: Milliseconds(init),
           attempts: Attempts(1),
           max_attempts }
  }

  /// The delay to arm the first retransmission timer with.
  pub fn first_delay(&self) -> Millis {
    self.next_delay
  }

  /// The retransmission timer fired and no ACK has arrived;
  /// should we resend?
  pub fn what_should_i_do(&mut self) -> YouShould {
    if self.attempts >= self.max_attempts {
      YouShould::Cry
    } else {
      self.attempts.0 += 1;
      self.next_delay = Milliseconds(self.next_delay.0 * 2);
      YouShould::Retry(self.next_delay)
    }
  }
}

#[cfg(test)]
mod test {
  use rand::SeedableRng;

  use super::*;

  fn rand() -> rand_chacha::ChaCha8Rng {
    rand_chacha::ChaCha8Rng::seed_from_u64(0xF00D)
  }

  #[test]
  fn initial_delay_within_window() {
    let strategy = Strategy::Exponential { init_min: Milliseconds(2_000),
                                           init_max: Milliseconds(3_000) };

    let mut rand = rand();
    for _ in 0..100 {
      let backoff = Backoff::new(strategy, Attempts(4), &mut rand);
      assert!((2_000..=3_000).contains(&backoff.first_delay().0));
    }
  }

  #[test]
  fn delay_doubles_until_exhausted() {
    let strategy = Strategy::Exponential { init_min: Milliseconds(1_000),
                                           init_max: Milliseconds(1_000) };

    let mut backoff = Backoff::new(strategy, Attempts(4), &mut rand());
    assert_eq!(backoff.first_delay(), Milliseconds(1_000u64));

    // attempt 1 happened before asking what_should_i_do
    assert_eq!(backoff.what_should_i_do(),
               YouShould::Retry(Milliseconds(2_000)));
    assert_eq!(backoff.what_should_i_do(),
               YouShould::Retry(Milliseconds(4_000)));
    assert_eq!(backoff.what_should_i_do(),
               YouShould::Retry(Milliseconds(8_000)));
    assert_eq!(backoff.what_should_i_do(), YouShould::Cry);
  }

  #[test]
  fn no_jitter_skips_the_rng() {
    let strategy = Strategy::Exponential { init_min: Milliseconds(500),
                                           init_max: Milliseconds(500) };
    assert!(!strategy.has_jitter());

    let backoff = Backoff::new(strategy, Attempts(1), &mut rand());
    assert_eq!(backoff.first_delay(), Milliseconds(500u64));
    assert_eq!(Backoff::new(strategy, Attempts(1), &mut rand()).what_should_i_do(),
               YouShould::Cry);
  }
}
