//! Listener fan-out with per-listener failure isolation.
//!
//! A failing or panicking callback is reported to the caller's error sink and
//! never prevents delivery to the callbacks registered after it.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerHandle(u64);

impl fmt::Display for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFailure {
    pub handle: ListenerHandle,
    pub message: String,
    pub panicked: bool,
}

pub trait ErrorSink {
    fn report(&mut self, failure: ListenerFailure);
}

/// Logs failures and drops them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn report(&mut self, failure: ListenerFailure) {
        tracing::warn!(
            listener = %failure.handle,
            panicked = failure.panicked,
            "Listener failed: {}",
            failure.message
        );
    }
}

/// Keeps failures for later inspection.
#[derive(Debug, Default, Clone)]
pub struct CollectErrorSink {
    pub failures: Vec<ListenerFailure>,
}

impl ErrorSink for CollectErrorSink {
    fn report(&mut self, failure: ListenerFailure) {
        self.failures.push(failure);
    }
}

type Callback<E> = Box<dyn FnMut(&E) -> anyhow::Result<()>>;

pub struct ListenerList<E> {
    next_handle: u64,
    entries: Vec<(ListenerHandle, Callback<E>)>,
}

impl<E> Default for ListenerList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for ListenerList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerList")
            .field("listeners", &self.entries.len())
            .finish()
    }
}

impl<E> ListenerList<E> {
    pub fn new() -> Self {
        Self {
            next_handle: 0,
            entries: Vec::new(),
        }
    }

    pub fn add<F>(&mut self, callback: F) -> ListenerHandle
    where
        F: FnMut(&E) -> anyhow::Result<()> + 'static,
    {
        let handle = ListenerHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push((handle, Box::new(callback)));
        handle
    }

    /// Returns false when the handle was not registered.
    pub fn remove(&mut self, handle: ListenerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(h, _)| *h != handle);
        before != self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deliver `event` to every listener in registration order.
    ///
    /// Returns the number of listeners that accepted the event without error.
    pub fn dispatch(&mut self, event: &E, sink: &mut dyn ErrorSink) -> usize {
        let mut delivered = 0;
        for (handle, callback) in &mut self.entries {
            match panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(err)) => sink.report(ListenerFailure {
                    handle: *handle,
                    message: format!("{err:#}"),
                    panicked: false,
                }),
                Err(payload) => sink.report(ListenerFailure {
                    handle: *handle,
                    message: panic_message(payload.as_ref()),
                    panicked: true,
                }),
            }
        }
        delivered
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "listener panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_dispatch_continues_after_failures() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut list: ListenerList<u32> = ListenerList::new();

        let s = seen.clone();
        list.add(move |e| {
            s.borrow_mut().push(("first", *e));
            Ok(())
        });
        let failing = list.add(|_| anyhow::bail!("cannot handle"));
        let panicking = list.add(|_| panic!("boom"));
        let s = seen.clone();
        list.add(move |e| {
            s.borrow_mut().push(("last", *e));
            Ok(())
        });

        let mut sink = CollectErrorSink::default();
        let delivered = list.dispatch(&7, &mut sink);

        assert_eq!(delivered, 2);
        assert_eq!(*seen.borrow(), vec![("first", 7), ("last", 7)]);
        assert_eq!(sink.failures.len(), 2);
        assert_eq!(sink.failures[0].handle, failing);
        assert_eq!(sink.failures[0].message, "cannot handle");
        assert!(!sink.failures[0].panicked);
        assert_eq!(sink.failures[1].handle, panicking);
        assert_eq!(sink.failures[1].message, "boom");
        assert!(sink.failures[1].panicked);
    }

    #[test]
    fn test_remove_listener() {
        let mut list: ListenerList<()> = ListenerList::new();
        let a = list.add(|_| Ok(()));
        let b = list.add(|_| Ok(()));
        assert!(list.remove(a));
        assert!(!list.remove(a));
        assert_eq!(list.len(), 1);
        assert_eq!(list.dispatch(&(), &mut LogErrorSink), 1);
        assert!(list.remove(b));
        assert!(list.is_empty());
    }
}
