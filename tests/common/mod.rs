//! Shared test infrastructure.

pub mod harness;

use std::cell::RefCell;
use std::rc::Rc;

use gridlink::{Document, EditorHooks};

/// Records hook invocations for assertions.
///
/// Clone it before handing it to the controller; clones share the recorded
/// state.
#[derive(Clone, Default)]
pub struct HookRecorder {
    pub added: Rc<RefCell<Vec<i32>>>,
    pub removed: Rc<RefCell<Vec<i32>>>,
}

impl HookRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn added_count(&self) -> usize {
        self.added.borrow().len()
    }

    pub fn removed_count(&self) -> usize {
        self.removed.borrow().len()
    }
}

impl EditorHooks for HookRecorder {
    fn connection_added(&mut self, _document: &mut Document, connection: i32) {
        self.added.borrow_mut().push(connection);
    }

    fn connection_removed(&mut self, _document: &mut Document, connection: i32) {
        self.removed.borrow_mut().push(connection);
    }
}
