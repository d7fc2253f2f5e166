//! Trailing debounce for rapidly changing values, such as a search box.

use std::pin::pin;
use std::time::Duration;

use async_stream::stream;
use futures::{Stream, StreamExt};
use tokio::time::Instant;
use tracing::trace;

/// Delay used for search input unless configured otherwise.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

enum Event<T> {
    Input(Option<T>),
    Elapsed,
}

/// Emit a value from `input` only once it has been stable for `delay`.
///
/// Each new value cancels the pending one and restarts the timer,
/// so intermediate values are never emitted.
/// Receiving the pending value again does not restart the timer,
/// and a value equal to the last emitted one is not emitted twice.
/// When `input` ends, the pending value is emitted immediately.
pub fn debounce<S>(input: S, delay: Duration) -> impl Stream<Item = S::Item>
where
    S: Stream,
    S::Item: Clone + PartialEq,
{
    stream! {
        let mut input = pin!(input);
        let mut timer = pin!(tokio::time::sleep(delay));
        let mut pending: Option<S::Item> = None;
        let mut last: Option<S::Item> = None;

        loop {
            let event = tokio::select! {
                next = input.next() => Event::Input(next),
                () = &mut timer, if pending.is_some() => Event::Elapsed,
            };

            match event {
                Event::Input(Some(value)) => {
                    let unchanged = match &pending {
                        Some(pending) => *pending == value,
                        None => last.as_ref() == Some(&value),
                    };
                    if unchanged {
                        continue;
                    }
                    trace!("debounce timer restarted");
                    pending = Some(value);
                    timer.as_mut().reset(Instant::now() + delay);
                },
                Event::Input(None) => {
                    if let Some(value) = pending.take() {
                        if last.as_ref() != Some(&value) {
                            yield value;
                        }
                    }
                    break;
                },
                Event::Elapsed => {
                    if let Some(value) = pending.take() {
                        if last.as_ref() != Some(&value) {
                            last = Some(value.clone());
                            yield value;
                        }
                    }
                },
            }
        }
    }
}

pub trait DebounceExt: Stream {
    /// See [debounce].
    fn debounce(self, delay: Duration) -> impl Stream<Item = Self::Item>
    where
        Self: Sized,
        Self::Item: Clone + PartialEq,
    {
        debounce(self, delay)
    }
}

impl<S: Stream> DebounceExt for S {}

#[cfg(test)]
mod tests {
    use futures::stream;
    use pretty_assertions::assert_eq;

    use super::*;

    /// Yield `events` at the given offsets (in ms) from the first poll,
    /// then stay open without yielding anything else.
    fn typed(events: Vec<(u64, &'static str)>) -> impl Stream<Item = &'static str> {
        let typed = stream! {
            let start = Instant::now();
            for (at, value) in events {
                tokio::time::sleep_until(start + Duration::from_millis(at)).await;
                yield value;
            }
        };
        typed.chain(stream::pending())
    }

    /// Collect the emissions of `stream` within `window`,
    /// together with the time (in ms) at which they were observed.
    async fn observe<S: Stream>(stream: S, window: Duration) -> Vec<(u128, S::Item)> {
        let start = Instant::now();
        let deadline = start + window;
        let mut stream = pin!(stream);
        let mut observed = Vec::new();
        while let Ok(Some(item)) = tokio::time::timeout_at(deadline, stream.next()).await {
            observed.push((start.elapsed().as_millis(), item));
        }
        observed
    }

    #[tokio::test(start_paused = true)]
    async fn emits_once_after_input_settles() {
        let input = typed(vec![(0, "a"), (50, "ab"), (100, "abc"), (350, "abc")]);
        let observed = observe(input.debounce(DEFAULT_DEBOUNCE), Duration::from_secs(2)).await;

        assert_eq!(observed.len(), 1);
        let (at, value) = observed[0];
        assert_eq!(value, "abc");
        assert!((400..=401).contains(&at), "emitted at {at}ms");
    }

    #[tokio::test(start_paused = true)]
    async fn new_value_cancels_pending_one() {
        let input = typed(vec![(0, "a"), (250, "b")]);
        let observed = observe(input.debounce(DEFAULT_DEBOUNCE), Duration::from_secs(2)).await;

        let values: Vec<_> = observed.iter().map(|(_, value)| *value).collect();
        assert_eq!(values, vec!["b"]);
        assert!(observed[0].0 >= 550);
    }

    #[tokio::test(start_paused = true)]
    async fn settled_values_are_all_emitted() {
        let input = typed(vec![(0, "shoes"), (400, "shirts")]);
        let observed = observe(input.debounce(DEFAULT_DEBOUNCE), Duration::from_secs(2)).await;

        let values: Vec<_> = observed.iter().map(|(_, value)| *value).collect();
        assert_eq!(values, vec!["shoes", "shirts"]);
    }

    #[tokio::test(start_paused = true)]
    async fn returning_to_last_value_emits_nothing() {
        let input = typed(vec![(0, "phone"), (400, "phones"), (450, "phone")]);
        let observed = observe(input.debounce(DEFAULT_DEBOUNCE), Duration::from_secs(2)).await;

        let values: Vec<_> = observed.iter().map(|(_, value)| *value).collect();
        assert_eq!(values, vec!["phone"]);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_value_is_flushed_when_input_ends() {
        let input = stream::iter(["a", "ab", "abc"]);
        let start = Instant::now();
        let values: Vec<_> = input.debounce(DEFAULT_DEBOUNCE).collect().await;

        assert_eq!(values, vec!["abc"]);
        assert!(start.elapsed() < DEFAULT_DEBOUNCE);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_input_emits_nothing() {
        let values: Vec<&str> = stream::empty::<&str>().debounce(DEFAULT_DEBOUNCE).collect().await;
        assert!(values.is_empty());
    }
}
