//! Fan-out of session state changes to registered observers.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;

use crate::state::SttState;

type Observer = Box<dyn Fn(SttState) + Send + Sync>;

/// Delivers every published state to every registered observer. A
/// panicking observer is isolated so the rest still receive the update.
#[derive(Default)]
pub struct StateBroadcaster {
    observers: Mutex<Vec<Observer>>,
}

impl StateBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, observer: F)
    where
        F: Fn(SttState) + Send + Sync + 'static,
    {
        self.observers
            .lock()
            .expect("observer list mutex poisoned")
            .push(Box::new(observer));
    }

    pub fn publish(&self, state: SttState) {
        let observers = self.observers.lock().expect("observer list mutex poisoned");
        for (index, observer) in observers.iter().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| observer(state))).is_err() {
                tracing::warn!(index, %state, "State observer panicked");
            }
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers
            .lock()
            .expect("observer list mutex poisoned")
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_all_observers_receive_each_state() {
        let broadcaster = StateBroadcaster::new();
        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&first);
        broadcaster.subscribe(move |s| sink.lock().unwrap().push(s));
        let sink = Arc::clone(&second);
        broadcaster.subscribe(move |s| sink.lock().unwrap().push(s));

        broadcaster.publish(SttState::Listening);
        broadcaster.publish(SttState::Done);

        let expected = vec![SttState::Listening, SttState::Done];
        assert_eq!(*first.lock().unwrap(), expected);
        assert_eq!(*second.lock().unwrap(), expected);
    }

    #[test]
    fn test_panicking_observer_does_not_block_others() {
        let broadcaster = StateBroadcaster::new();
        broadcaster.subscribe(|_| panic!("bad observer"));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        broadcaster.subscribe(move |s| sink.lock().unwrap().push(s));

        broadcaster.publish(SttState::Transcribing);
        assert_eq!(*seen.lock().unwrap(), vec![SttState::Transcribing]);
    }

    #[test]
    fn test_publish_with_no_observers_is_a_noop() {
        let broadcaster = StateBroadcaster::new();
        broadcaster.publish(SttState::Error);
        assert_eq!(broadcaster.observer_count(), 0);
    }
}
