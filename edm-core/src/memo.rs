#![forbid(unsafe_code)]

//! Write-once memoization with re-entrance detection.
//!
//! A [`Memo`] evaluates its compute closure at most once. While the closure
//! runs the cell is `InProgress`; a nested access to the same cell from that
//! closure is a cycle. With a cycle handler the nested access gets the
//! handler's value (uncached) and the outer evaluation still decides what is
//! stored. Without one, re-entrance is a contract violation and panics.

use std::cell::RefCell;
use std::fmt;

enum MemoState<T> {
    Empty,
    InProgress,
    Filled(T),
}

pub struct Memo<T> {
    state: RefCell<MemoState<T>>,
}

impl<T> Memo<T> {
    pub const fn new() -> Self {
        Self {
            state: RefCell::new(MemoState::Empty),
        }
    }

    /// True while the compute closure of this cell is on the stack.
    pub fn is_in_progress(&self) -> bool {
        matches!(*self.state.borrow(), MemoState::InProgress)
    }

    pub fn is_filled(&self) -> bool {
        matches!(*self.state.borrow(), MemoState::Filled(_))
    }
}

impl<T: Clone> Memo<T> {
    /// Value for relations that are acyclic by construction.
    ///
    /// # Panics
    ///
    /// Panics if `compute` re-enters this cell.
    pub fn get(&self, compute: impl FnOnce() -> T) -> T {
        self.eval(compute, None::<fn() -> T>)
    }

    /// Value for relations that may form cycles; a re-entrant access returns
    /// `on_cycle()` instead of recursing.
    pub fn get_or_cycle(&self, compute: impl FnOnce() -> T, on_cycle: impl FnOnce() -> T) -> T {
        self.eval(compute, Some(on_cycle))
    }

    pub fn peek(&self) -> Option<T> {
        match &*self.state.borrow() {
            MemoState::Filled(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn eval(&self, compute: impl FnOnce() -> T, on_cycle: Option<impl FnOnce() -> T>) -> T {
        let reentered = match &*self.state.borrow() {
            MemoState::Filled(v) => return v.clone(),
            MemoState::InProgress => true,
            MemoState::Empty => false,
        };

        if reentered {
            return match on_cycle {
                Some(f) => f(),
                None => panic!("memo cell re-entered without a cycle handler"),
            };
        }

        *self.state.borrow_mut() = MemoState::InProgress;
        let value = compute();
        *self.state.borrow_mut() = MemoState::Filled(value.clone());
        value
    }
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.state.borrow() {
            MemoState::Empty => f.write_str("Memo(<empty>)"),
            MemoState::InProgress => f.write_str("Memo(<in progress>)"),
            MemoState::Filled(v) => f.debug_tuple("Memo").field(v).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn computes_once() {
        let memo: Memo<u32> = Memo::new();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            7
        };
        assert_eq!(memo.get(compute), 7);
        assert_eq!(memo.get(|| unreachable!("cached")), 7);
        assert_eq!(calls.get(), 1);
        assert!(memo.is_filled());
    }

    #[test]
    fn reentrance_uses_cycle_handler_and_outer_value_wins() {
        struct Node {
            memo: Memo<&'static str>,
        }
        fn value(node: &Node, seen: &Cell<Option<&'static str>>) -> &'static str {
            node.memo.get_or_cycle(
                || {
                    seen.set(Some(value(node, seen)));
                    "outer"
                },
                || "cycle",
            )
        }

        let node = Node { memo: Memo::new() };
        let seen = Cell::new(None);
        assert_eq!(value(&node, &seen), "outer");
        assert_eq!(seen.get(), Some("cycle"));
        assert_eq!(node.memo.peek(), Some("outer"));
    }

    #[test]
    #[should_panic(expected = "re-entered")]
    fn reentrance_without_handler_panics() {
        fn value(memo: &Memo<u8>) -> u8 {
            memo.get(|| value(memo))
        }
        let memo = Memo::new();
        value(&memo);
    }

    #[test]
    fn in_progress_is_visible_from_compute() {
        let memo: Memo<bool> = Memo::new();
        let inner = memo.get_or_cycle(|| memo.is_in_progress(), || false);
        assert!(inner);
        assert!(!memo.is_in_progress());
    }
}
