#![forbid(unsafe_code)]

//! Shared value with change notification.
//!
//! [`Observable<T>`] keeps a value in `Rc<RefCell<..>>` storage. Setting a
//! value that differs (by `PartialEq`) bumps the version and notifies live
//! subscribers in registration order. The story publishes its
//! [`MotionProfile`](longform_core::motion::MotionProfile) and the current
//! chapter index this way, so every reader sees one source of truth.
//!
//! # Failure Modes
//!
//! - **Subscriber leak**: a [`Subscription`] that is never dropped keeps its
//!   callback alive. Dead entries are pruned lazily during notification.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, debug_span};
use web_time::Instant;

type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

struct ObservableInner<T> {
    value: T,
    version: u64,
    subscribers: Vec<CallbackWeak<T>>,
}

/// A shared, version-tracked value.
///
/// Cloning an `Observable` creates a new handle to the **same** state.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on each value-changing mutation.
/// 2. `set(v)` where `v == current` is a no-op.
/// 3. Subscribers are notified in registration order.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
    name: &'static str,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            name: self.name,
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("name", &self.name)
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + std::fmt::Debug + 'static> Observable<T> {
    /// New observable at version 0. `name` labels its log events.
    #[must_use]
    pub fn new(name: &'static str, value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
            name,
        }
    }

    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Borrow the current value without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Set a new value. Returns `true` when it changed and subscribers ran.
    ///
    /// Safe to call from inside a subscriber callback.
    pub fn set(&self, value: T) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return false;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
        true
    }

    /// Modify the value in place. Notifies only if it changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let changed = {
            let mut inner = self.inner.borrow_mut();
            let old = inner.value.clone();
            f(&mut inner.value);
            if inner.value != old {
                inner.version += 1;
                true
            } else {
                false
            }
        };
        if changed {
            self.notify();
        }
        changed
    }

    /// Subscribe to changes. Dropping the returned guard unsubscribes.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        let weak = Rc::downgrade(&strong);
        self.inner.borrow_mut().subscribers.push(weak);
        Subscription {
            _guard: Box::new(strong),
        }
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    fn notify(&self) {
        // Collect first so no borrow is held while callbacks run.
        let callbacks: Vec<CallbackRc<T>> = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|w| w.strong_count() > 0);
            inner.subscribers.iter().filter_map(Weak::upgrade).collect()
        };

        let (value, version) = {
            let inner = self.inner.borrow();
            (inner.value.clone(), inner.version)
        };
        let subscribers = callbacks.len() as u64;
        let start = Instant::now();
        let _span = debug_span!(
            "longform.observable.notify",
            name = self.name,
            version,
            subscribers,
            duration_us = tracing::field::Empty
        )
        .entered();

        for cb in &callbacks {
            cb(&value);
        }

        let duration_us = start.elapsed().as_micros() as u64;
        tracing::Span::current().record("duration_us", duration_us);
        debug!(name = self.name, value = ?value, version, "published");
    }
}

/// RAII guard for a subscriber callback.
pub struct Subscription {
    /// Type-erased strong reference keeping the callback alive.
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn set_same_value_is_noop() {
        let obs = Observable::new("n", 3);
        assert!(!obs.set(3));
        assert_eq!(obs.version(), 0);
        assert!(obs.set(4));
        assert_eq!(obs.version(), 1);
        assert_eq!(obs.get(), 4);
    }

    #[test]
    fn subscribers_see_changes_in_order() {
        let obs = Observable::new("n", 0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = {
            let log = Rc::clone(&log);
            obs.subscribe(move |v| log.borrow_mut().push(("a", *v)))
        };
        let _b = {
            let log = Rc::clone(&log);
            obs.subscribe(move |v| log.borrow_mut().push(("b", *v)))
        };
        obs.set(1);
        drop(a);
        obs.set(2);
        assert_eq!(*log.borrow(), vec![("a", 1), ("b", 1), ("b", 2)]);
        assert_eq!(obs.subscriber_count(), 1);
    }

    #[test]
    fn update_only_notifies_on_change() {
        let obs = Observable::new("v", vec![1, 2]);
        let hits = Rc::new(Cell::new(0));
        let _sub = {
            let hits = Rc::clone(&hits);
            obs.subscribe(move |_| hits.set(hits.get() + 1))
        };
        assert!(!obs.update(|v| v.sort()));
        assert!(obs.update(|v| v.push(3)));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn clones_share_state() {
        let a = Observable::new("n", 'x');
        let b = a.clone();
        b.set('y');
        assert_eq!(a.get(), 'y');
        assert!(a.with(|c| c.is_ascii()));
    }

    #[test]
    fn reentrant_set_from_subscriber() {
        let obs = Observable::new("n", 0);
        let echo = obs.clone();
        let _sub = obs.subscribe(move |v| {
            if *v == 1 {
                echo.set(2);
            }
        });
        obs.set(1);
        assert_eq!(obs.get(), 2);
        assert_eq!(obs.version(), 2);
    }
}
