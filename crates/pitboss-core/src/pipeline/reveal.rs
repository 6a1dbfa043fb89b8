//! Timer-driven reveal of an already received reply.
//!
//! Every step yields the full prefix revealed so far rather than a delta, so
//! consumers simply replace the message content. A real streaming transport
//! can feed the same contract later.

use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::constants::reveal::{CHUNK_CHARS, INTERVAL_MS};
use crate::error::PitbossError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealSchedule {
    chunk_chars: usize,
    interval: Duration,
}

impl RevealSchedule {
    pub fn new(chunk_chars: usize, interval: Duration) -> Self {
        Self {
            chunk_chars: chunk_chars.max(1),
            // tokio intervals reject a zero period
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    pub fn chunk_chars(&self) -> usize {
        self.chunk_chars
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Prefixes of `text` in reveal order. Always yields at least one item,
    /// and the last one is `text` itself.
    pub fn steps<'a>(&self, text: &'a str) -> RevealSteps<'a> {
        RevealSteps {
            text,
            chunk_chars: self.chunk_chars,
            offset: 0,
            done: false,
        }
    }
}

impl Default for RevealSchedule {
    fn default() -> Self {
        Self::new(CHUNK_CHARS, Duration::from_millis(INTERVAL_MS))
    }
}

pub struct RevealSteps<'a> {
    text: &'a str,
    chunk_chars: usize,
    offset: usize,
    done: bool,
}

impl<'a> Iterator for RevealSteps<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.done {
            return None;
        }
        let rest = &self.text[self.offset..];
        let advance = rest
            .char_indices()
            .nth(self.chunk_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.offset += advance;
        if self.offset >= self.text.len() {
            self.done = true;
        }
        Some(&self.text[..self.offset])
    }
}

/// Reveal `text` one step per tick. `emit` returns `false` once nobody is
/// listening, which ends the reveal early without an error.
pub async fn reveal<F>(
    text: &str,
    schedule: RevealSchedule,
    cancel: &CancellationToken,
    mut emit: F,
) -> Result<(), PitbossError>
where
    F: FnMut(&str) -> bool,
{
    let mut ticker = interval_at(Instant::now() + schedule.interval, schedule.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for prefix in schedule.steps(text) {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PitbossError::Cancelled),
            _ = ticker.tick() => {}
        }
        if !emit(prefix) {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_in_three_char_chunks() {
        let schedule = RevealSchedule::default();
        let steps: Vec<&str> = schedule.steps("Hello!!").collect();
        assert_eq!(steps, vec!["Hel", "Hello!", "Hello!!"]);
    }

    #[test]
    fn test_steps_exact_multiple() {
        let schedule = RevealSchedule::default();
        let steps: Vec<&str> = schedule.steps("abcdef").collect();
        assert_eq!(steps, vec!["abc", "abcdef"]);
    }

    #[test]
    fn test_empty_text_reveals_once() {
        let schedule = RevealSchedule::default();
        let steps: Vec<&str> = schedule.steps("").collect();
        assert_eq!(steps, vec![""]);
    }

    #[test]
    fn test_steps_respect_char_boundaries() {
        let schedule = RevealSchedule::default();
        let steps: Vec<&str> = schedule.steps("€€€€").collect();
        assert_eq!(steps, vec!["€€€", "€€€€"]);
    }

    #[test]
    fn test_zero_chunk_is_clamped() {
        let schedule = RevealSchedule::new(0, Duration::from_millis(1));
        assert_eq!(schedule.chunk_chars(), 1);
        assert_eq!(schedule.steps("ab").count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_follows_interval() {
        let start = Instant::now();
        let cancel = CancellationToken::new();
        let mut seen = Vec::new();

        reveal("Hi!", RevealSchedule::default(), &cancel, |p| {
            seen.push(p.to_string());
            true
        })
        .await
        .unwrap();

        assert_eq!(seen, vec!["Hi!"]);
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_stops_on_cancel() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = reveal("Hello world", RevealSchedule::default(), &cancel, |_| true).await;
        assert!(matches!(result, Err(PitbossError::Cancelled)));
    }
}
