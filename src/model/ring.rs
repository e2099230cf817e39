//! The per-screen ordered window collection.
//!
//! A doubly linked sequence of window handles stored in a slot arena, plus a
//! single focus cursor. The cursor points at exactly one element whenever the
//! collection is non-empty and at nothing when it is empty; every operation
//! preserves that invariant, so "at end with a current element" is not a
//! representable state.

use slotmap::{SlotMap, new_key_type};
use thiserror::Error;

use crate::sys::window_server::WindowHandle;

new_key_type! {
    struct NodeKey;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CycleDirection {
    Forward,
    Backward,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RingError {
    #[error("the window collection is empty")]
    Empty,
    #[error("window {0} is not in the collection")]
    NotFound(WindowHandle),
}

#[derive(Debug)]
struct Node {
    window: WindowHandle,
    prev: Option<NodeKey>,
    next: Option<NodeKey>,
}

#[derive(Debug, Default)]
pub struct WindowRing {
    nodes: SlotMap<NodeKey, Node>,
    head: Option<NodeKey>,
    tail: Option<NodeKey>,
    cursor: Option<NodeKey>,
}

impl WindowRing {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.nodes.len() }

    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// The window under the cursor, or none if the collection is empty.
    pub fn current(&self) -> Option<WindowHandle> {
        self.cursor.map(|key| self.nodes[key].window)
    }

    /// The full sequence in order, independent of the cursor.
    pub fn elements(&self) -> Vec<WindowHandle> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut key = self.head;
        while let Some(k) = key {
            let node = &self.nodes[k];
            out.push(node.window);
            key = node.next;
        }
        out
    }

    pub fn contains(&self, window: WindowHandle) -> bool { self.find(window).is_some() }

    /// Inserts `window` and focuses it. The new element lands directly ahead
    /// of whatever was focused before, or at the end if nothing was.
    pub fn add(&mut self, window: WindowHandle) {
        let key = match self.cursor {
            None => self.push_back(window),
            Some(cursor) => self.insert_before(cursor, window),
        };
        self.cursor = Some(key);
    }

    /// Removes the element under the cursor. The cursor lands on the next
    /// element if one exists, else the previous, else nothing.
    pub fn remove_current(&mut self) -> Result<WindowHandle, RingError> {
        let cursor = self.cursor.ok_or(RingError::Empty)?;
        let node = self.nodes.remove(cursor).ok_or(RingError::Empty)?;
        match node.prev {
            Some(prev) => self.nodes[prev].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => self.nodes[next].prev = node.prev,
            None => self.tail = node.prev,
        }
        self.cursor = node.next.or(node.prev);
        Ok(node.window)
    }

    /// Removes `window` by identity, leaving the cursor on its neighbor per
    /// [`Self::remove_current`].
    pub fn remove(&mut self, window: WindowHandle) -> Result<WindowHandle, RingError> {
        let key = self.find(window).ok_or(RingError::NotFound(window))?;
        self.cursor = Some(key);
        self.remove_current()
    }

    /// Moves the cursor onto `window` if present. A miss is an error only
    /// when `must_exist` is set; otherwise it is a silent no-op.
    pub fn focus(&mut self, window: WindowHandle, must_exist: bool) -> Result<(), RingError> {
        match self.find(window) {
            Some(key) => {
                self.cursor = Some(key);
                Ok(())
            }
            None if must_exist => Err(RingError::NotFound(window)),
            None => Ok(()),
        }
    }

    /// Moves the cursor to the neighboring element, wrapping around at either
    /// end. Does nothing on an empty collection.
    pub fn cycle(&mut self, direction: CycleDirection) {
        let Some(cursor) = self.cursor else {
            return;
        };
        self.cursor = match direction {
            CycleDirection::Forward => self.nodes[cursor].next.or(self.head),
            CycleDirection::Backward => self.nodes[cursor].prev.or(self.tail),
        };
    }

    fn find(&self, window: WindowHandle) -> Option<NodeKey> {
        let mut key = self.head;
        while let Some(k) = key {
            let node = &self.nodes[k];
            if node.window == window {
                return Some(k);
            }
            key = node.next;
        }
        None
    }

    fn push_back(&mut self, window: WindowHandle) -> NodeKey {
        let key = self.nodes.insert(Node { window, prev: self.tail, next: None });
        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        key
    }

    fn insert_before(&mut self, at: NodeKey, window: WindowHandle) -> NodeKey {
        let prev = self.nodes[at].prev;
        let key = self.nodes.insert(Node { window, prev, next: Some(at) });
        self.nodes[at].prev = Some(key);
        match prev {
            Some(p) => self.nodes[p].next = Some(key),
            None => self.head = Some(key),
        }
        key
    }
}
