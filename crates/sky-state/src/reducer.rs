//! Reducer trait
//!
//! A [`Reducer`] folds one resolved envelope into a slice of state. Reducers
//! are pure: same inputs, same output, no I/O. Returning the input `Arc`
//! unchanged signals "not recognized" and lets the store skip notification.

use sky_protocol::OperationEnvelope;
use std::any::Any;
use std::sync::Arc;

/// Pure state transition for one named slice
pub trait Reducer: Send + Sync + 'static {
    /// Slice state
    type State: Default + Send + Sync + 'static;

    /// Compute next state
    ///
    /// Must return `Arc::clone(state)` for envelopes it does not recognize.
    fn reduce(&self, state: &Arc<Self::State>, action: &OperationEnvelope) -> Arc<Self::State>;
}

/// Type-erased slice state
pub(crate) type SliceState = Arc<dyn Any + Send + Sync>;

/// Object-safe form of [`Reducer`] used by the store
pub(crate) trait ErasedReducer: Send + Sync {
    fn initial(&self) -> SliceState;

    fn reduce_erased(&self, state: &SliceState, action: &OperationEnvelope) -> SliceState;
}

impl<R: Reducer> ErasedReducer for R {
    fn initial(&self) -> SliceState {
        Arc::new(R::State::default())
    }

    fn reduce_erased(&self, state: &SliceState, action: &OperationEnvelope) -> SliceState {
        let Ok(typed) = Arc::clone(state).downcast::<R::State>() else {
            return Arc::clone(state);
        };

        let next = self.reduce(&typed, action);
        if Arc::ptr_eq(&next, &typed) {
            Arc::clone(state)
        } else {
            let next: SliceState = next;
            next
        }
    }
}
