//! Socket callbacks can fire while the page is still inside a call into the
//! client, e.g. when `forwardToUi` runs a nested event loop. Such events wait
//! in a queue and are handled in arrival order as soon as the state is free.

use std::cell::RefCell;
use std::collections::VecDeque;

pub struct Serialized<S, E> {
    state: RefCell<S>,
    deferred: RefCell<VecDeque<E>>,
    handle: fn(&mut S, E),
}

impl<S, E> Serialized<S, E> {
    pub fn new(state: S, handle: fn(&mut S, E)) -> Self {
        Serialized {
            state: RefCell::new(state),
            deferred: RefCell::new(VecDeque::new()),
            handle,
        }
    }

    /// Handles `event` now, or after whatever currently holds the state.
    pub fn push(&self, event: E) {
        self.deferred.borrow_mut().push_back(event);
        self.drain();
    }

    /// Runs `act` on the state and then handles everything that queued up
    /// meanwhile. `None` if the state is busy.
    pub fn with_mut<R>(&self, act: impl FnOnce(&mut S) -> R) -> Option<R> {
        let result = {
            let mut state = self.state.try_borrow_mut().ok()?;
            act(&mut state)
        };
        self.drain();
        Some(result)
    }

    /// `None` while the state is being changed.
    pub fn with<R>(&self, read: impl FnOnce(&S) -> R) -> Option<R> {
        let state = self.state.try_borrow().ok()?;
        Some(read(&state))
    }

    pub fn pending(&self) -> usize {
        self.deferred.borrow().len()
    }

    fn drain(&self) {
        let Ok(mut state) = self.state.try_borrow_mut() else {
            return;
        };
        loop {
            // The queue borrow ends before the handler can push again.
            let next = self.deferred.borrow_mut().pop_front();
            match next {
                Some(event) => (self.handle)(&mut state, event),
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(seen: &mut Vec<u32>, event: u32) {
        seen.push(event);
    }

    #[test]
    fn events_while_busy_are_handled_afterwards_in_order() {
        let queue = Serialized::new(vec![], record);
        queue.push(1);
        let inner = queue.with_mut(|seen| {
            queue.push(2);
            queue.push(3);
            assert_eq!(queue.pending(), 2);
            assert_eq!(queue.with(|seen| seen.len()), None);
            seen.push(10);
        });
        assert_eq!(inner, Some(()));
        assert_eq!(queue.pending(), 0);
        assert_eq!(queue.with(Vec::clone), Some(vec![1, 10, 2, 3]));
    }

    #[test]
    fn nested_change_is_refused() {
        let queue = Serialized::new(vec![], record);
        let nested = queue.with_mut(|_| queue.with_mut(|seen: &mut Vec<u32>| seen.push(1)));
        assert_eq!(nested, Some(None));
        assert_eq!(queue.with(Vec::len), Some(0));
    }
}
