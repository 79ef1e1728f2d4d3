//! Search input debouncing.

use std::time::Duration;

use tokio::sync::mpsc;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Lets only the last of a burst of inputs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debouncer {
    delay: Duration,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait for the next input, then keep taking newer ones until the input
    /// has been quiet for the delay. Returns the last one seen, or `None`
    /// once the sender is gone and nothing is pending.
    pub async fn next_settled<T>(&self, input: &mut mpsc::Receiver<T>) -> Option<T> {
        let mut latest = input.recv().await?;
        loop {
            match tokio::time::timeout(self.delay, input.recv()).await {
                Ok(Some(newer)) => latest = newer,
                Ok(None) | Err(_) => return Some(latest),
            }
        }
    }
}
