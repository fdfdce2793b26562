//! Deferred execution of embedder code
//!
//! Listeners and custom methods are collected while the document is
//! borrowed and run afterwards, so they are free to read or mutate the
//! document (or anything sharing it) themselves.
//!
//! ```text
//! let call = doc.borrow_mut().begin_call(node, "click", &[])?;  // borrow ends here
//! call.run();                                                   // listeners run here
//! ```

use crate::types::{Arg, Event, Listener, Method, NodeId, Value};

/// Listener invocations collected along an event path, target first
#[must_use = "listeners only run when the dispatch is run"]
#[derive(Debug, Default)]
pub struct Dispatch {
    calls: Vec<(Listener, Event)>,
}

impl Dispatch {
    pub(crate) fn push(&mut self, listener: Listener, event: Event) {
        self.calls.push((listener, event));
    }

    /// Listeners that will be invoked
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Invoke every collected listener in path order; returns how many ran
    pub fn run(self) -> usize {
        let invoked = self.calls.len();
        for (listener, event) in self.calls {
            listener.call(&event);
        }
        invoked
    }
}

/// A method call prepared by `Document::begin_call`
///
/// Document-side effects of builtins have already happened; what remains
/// is embedder code (listeners, custom methods).
#[must_use = "the call is incomplete until it is run"]
#[derive(Debug)]
pub enum PendingCall {
    /// Nothing left to run
    Done(Value),
    /// Fire the collected listeners, then yield `result`
    Dispatch { dispatch: Dispatch, result: Value },
    /// Run a custom method
    Custom {
        method: Method,
        node_id: NodeId,
        args: Vec<Arg>,
    },
}

impl PendingCall {
    pub fn run(self) -> Value {
        match self {
            PendingCall::Done(value) => value,
            PendingCall::Dispatch { dispatch, result } => {
                dispatch.run();
                result
            }
            PendingCall::Custom {
                method,
                node_id,
                args,
            } => method.invoke(node_id, &args),
        }
    }
}
