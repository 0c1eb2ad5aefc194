use crate::utils::time_utils::current_timestamp;

/**
 * Just count the amount of times sensible endpoints are
 * being called per unit of time, supposed to block them
 * entirely for a specific "block time" when that happens.
 * Only the translation endpoint uses it for now, the
 * free translation services don't like being hammered.
 */
pub struct BasicRateLimiter {
  counter: u32,
  last_update: i64,
  is_limited: bool,
  max_requests: u32,
  max_requests_time: u32,
  block_duration: u32
}

impl BasicRateLimiter {

  pub fn new(
    max_requests: u32,
    max_requests_time: u32,
    block_duration: u32
  ) -> Self {
    Self {
      counter: 0,
      last_update: current_timestamp(),
      is_limited: false,
      max_requests,
      max_requests_time,
      block_duration
    }
  }

  pub fn is_locked(&self) -> bool {
    self.is_limited
  }

  pub fn is_expired(&self) -> bool {
    self.is_expired_at(current_timestamp())
  }

  // If currently locked, check if past block_duration.
  // Check if past max_requests_time otherwise.
  fn is_expired_at(&self, now: i64) -> bool {
    if self.is_locked() {
      now - self.last_update >= self.block_duration.into()
    } else {
      now - self.last_update >= self.max_requests_time.into()
    }
  }

  // Returns the lock state after counting the current
  // request, so callers can reject it right away.
  pub fn update(&mut self) -> bool {
    self.update_at(current_timestamp())
  }

  // The clock comes in as a parameter so the tests
  // don't have to sleep.
  fn update_at(&mut self, now: i64) -> bool {
    if self.is_expired_at(now) {
      // Reset:
      self.counter = 0;
      self.last_update = now;
      self.is_limited = false;
    } else {
      self.counter += 1;
      // Are we above the rate limit?
      if self.counter >= self.max_requests {
        self.is_limited = true;
        // Reset last_update so the block lasts the
        // full block_duration from this point:
        self.last_update = now;
      }
    }
    self.is_limited
  }

}

#[cfg(test)]
mod tests {
  use super::*;

  fn sut() -> BasicRateLimiter {
    // 5 requests per 60 seconds, blocks for 120:
    BasicRateLimiter::new(5, 60, 120)
  }

  #[test]
  fn stays_unlocked_below_the_limit() {
    let mut sut = sut();
    let now = sut.last_update;
    for _ in 0..3 {
      assert!(!sut.update_at(now + 1));
    }
    assert!(!sut.is_locked());
  }

  #[test]
  fn locks_when_the_limit_is_reached() {
    let mut sut = sut();
    let now = sut.last_update;
    for _ in 0..4 {
      assert!(!sut.update_at(now + 1));
    }
    // Fifth request in the same window trips it:
    assert!(sut.update_at(now + 2));
    assert!(sut.is_locked());
  }

  #[test]
  fn the_lock_expires_after_the_block_duration() {
    let mut sut = sut();
    let now = sut.last_update;
    for _ in 0..5 {
      sut.update_at(now + 1);
    }
    assert!(sut.is_locked());
    assert!(!sut.is_expired_at(now + 100));
    assert!(sut.is_expired_at(now + 1 + 120));
    // The update after expiry resets everything:
    assert!(!sut.update_at(now + 1 + 120));
    assert!(!sut.is_locked());
  }

  #[test]
  fn an_idle_window_resets_the_counter() {
    let mut sut = sut();
    let now = sut.last_update;
    for _ in 0..4 {
      sut.update_at(now + 1);
    }
    // A minute of silence, the counter starts over:
    assert!(!sut.update_at(now + 61));
    for _ in 0..3 {
      assert!(!sut.update_at(now + 62));
    }
  }

}
