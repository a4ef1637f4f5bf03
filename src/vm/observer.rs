//! Callbacks fired by the VM as it runs.
//!
//! Front ends implement [`VmObserver`] to redraw on state changes and to
//! report why a run stopped. For every step that ends a run exactly one of
//! `on_error` and `on_halt` fires.

use std::cell::RefCell;
use std::rc::Rc;
use crate::vm::VmSnapshot;

/// Receiver for VM events. All methods default to doing nothing.
pub trait VmObserver {
    /// After every step that executed an instruction, and after a step back.
    fn on_state_change(&mut self, _snapshot: &VmSnapshot) {}

    /// The run stopped on an execution fault.
    fn on_error(&mut self, _message: &str) {}

    /// The run stopped normally or at a breakpoint.
    fn on_halt(&mut self, _message: &str) {}
}

/// A recorded VM event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmEvent {
    StateChange { pc: usize, accumulator: i64 },
    Error(String),
    Halt(String),
}

/// Observer that records events into a shared list.
///
/// Clone the log before handing it to the VM to keep a reading handle.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<VmEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<VmEvent> {
        self.events.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl VmObserver for EventLog {
    fn on_state_change(&mut self, snapshot: &VmSnapshot) {
        self.events.borrow_mut().push(VmEvent::StateChange {
            pc: snapshot.program_counter,
            accumulator: snapshot.accumulator,
        });
    }

    fn on_error(&mut self, message: &str) {
        self.events.borrow_mut().push(VmEvent::Error(message.to_string()));
    }

    fn on_halt(&mut self, message: &str) {
        self.events.borrow_mut().push(VmEvent::Halt(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::Vm;

    #[test]
    fn test_halt_step_reports_change_then_halt() {
        let log = EventLog::new();
        let mut vm = Vm::new();
        vm.add_observer(Box::new(log.clone()));
        vm.load_words(&[9, 0]);
        vm.run(10);

        assert_eq!(
            log.drain(),
            vec![
                VmEvent::StateChange { pc: 1, accumulator: 1 },
                VmEvent::StateChange { pc: 1, accumulator: 1 },
                VmEvent::Halt("Halt instruction (0) encountered".into()),
            ]
        );
    }

    #[test]
    fn test_fault_reports_only_error() {
        let log = EventLog::new();
        let mut vm = Vm::new();
        vm.add_observer(Box::new(log.clone()));
        vm.load_words(&[-7]);
        let _ = vm.step();

        assert_eq!(log.drain(), vec![VmEvent::Error("Return with empty call stack".into())]);
    }

    #[test]
    fn test_breakpoint_reports_halt_without_change() {
        let log = EventLog::new();
        let mut vm = Vm::new();
        vm.add_observer(Box::new(log.clone()));
        vm.load_words(&[9, 0]);
        vm.debug_mut().breakpoints.add(0);
        vm.step().unwrap();

        assert_eq!(log.drain(), vec![VmEvent::Halt("Breakpoint hit at address 0".into())]);
    }
}
