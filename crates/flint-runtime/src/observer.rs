//! Subscriber lists with token-based removal

use flint_core::{FlintError, Result};
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter so tokens are unique across every observer list
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Returned by every `subscribe` call; pass it back to unsubscribe
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct SubscriptionToken(u64);

impl SubscriptionToken {
    pub(crate) fn next() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

/// A subscriber callback. Failures are collected, never swallowed.
pub type Handler<E> = Box<dyn FnMut(&E) -> Result<()>>;

/// Ordered list of subscribers for one kind of notification
pub struct Observers<E> {
    entries: Vec<(SubscriptionToken, Handler<E>)>,
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Observers<E> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a subscriber at the end of the list
    pub fn subscribe(&mut self, handler: impl FnMut(&E) -> Result<()> + 'static) -> SubscriptionToken {
        let token = SubscriptionToken::next();
        self.entries.push((token, Box::new(handler)));
        token
    }

    /// Remove a subscriber. Returns false if the token is not in this list.
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(t, _)| *t != token);
        self.entries.len() != before
    }

    pub fn contains(&self, token: SubscriptionToken) -> bool {
        self.entries.iter().any(|(t, _)| *t == token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Invoke every subscriber in order.
    ///
    /// A failing subscriber does not stop the others; its error is pushed
    /// onto `failures`.
    pub fn notify(&mut self, event: &E, failures: &mut Vec<FlintError>) {
        for (_, handler) in &mut self.entries {
            if let Err(err) = handler(event) {
                failures.push(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_notify_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut observers = Observers::<u32>::new();

        let l = log.clone();
        observers.subscribe(move |v| {
            l.borrow_mut().push(("first", *v));
            Ok(())
        });
        let l = log.clone();
        observers.subscribe(move |v| {
            l.borrow_mut().push(("second", *v));
            Ok(())
        });

        let mut failures = Vec::new();
        observers.notify(&7, &mut failures);

        assert!(failures.is_empty());
        assert_eq!(*log.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn test_unsubscribe_by_token() {
        let hits = Rc::new(RefCell::new(0));
        let mut observers = Observers::<()>::new();

        let h = hits.clone();
        let token = observers.subscribe(move |_| {
            *h.borrow_mut() += 1;
            Ok(())
        });

        assert!(observers.contains(token));
        assert!(observers.unsubscribe(token));
        assert!(!observers.unsubscribe(token));

        observers.notify(&(), &mut Vec::new());
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn test_failure_does_not_stop_others() {
        let hits = Rc::new(RefCell::new(0));
        let mut observers = Observers::<()>::new();

        observers.subscribe(|_| Err(FlintError::HandlerError("boom".into())));
        let h = hits.clone();
        observers.subscribe(move |_| {
            *h.borrow_mut() += 1;
            Ok(())
        });

        let mut failures = Vec::new();
        observers.notify(&(), &mut failures);

        assert_eq!(failures.len(), 1);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_tokens_unique_across_lists() {
        let mut a = Observers::<()>::new();
        let mut b = Observers::<()>::new();
        let ta = a.subscribe(|_| Ok(()));
        let tb = b.subscribe(|_| Ok(()));
        assert_ne!(ta, tb);
        assert!(!a.unsubscribe(tb));
    }
}
