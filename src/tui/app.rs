//! Debugger application state and logic.
//!
//! The app is the run driver: continuous execution is one `step()` per tick,
//! stopping on the first step that does not return `Continue`.

use std::time::Duration;
use crate::asm::disasm::disassemble_at;
use crate::config::VmConfig;
use crate::vm::{EventLog, StepOutcome, Vm, VmEvent};

/// Debugger application state.
pub struct DebuggerApp {
    /// The VM being debugged.
    pub vm: Vm,
    /// Original program, reloaded on reset.
    pub program: Vec<i64>,
    /// Halt and error messages reported by the VM.
    events: EventLog,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset.
    pub mem_scroll: usize,
    /// Memory cell under the cursor.
    pub selected_addr: usize,
    /// Show access counts instead of values.
    pub show_heatmap: bool,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Vec<i64>, config: VmConfig) -> Self {
        let events = EventLog::new();
        let mut vm = Vm::with_config(config);
        vm.add_observer(Box::new(events.clone()));
        vm.load_words(&program);

        Self {
            vm,
            program,
            events,
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            mem_scroll: 0,
            selected_addr: 0,
            show_heatmap: false,
        }
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        let pc = self.vm.pc();
        let listing = disassemble_at(self.vm.memory().cells(), pc).0;
        match self.vm.step() {
            Ok(StepOutcome::Continue) => {
                self.events.drain();
                self.status = format!("PC={:03}: {}  ACC={}", pc, listing, self.vm.accumulator());
            }
            Ok(StepOutcome::Halted(_)) | Err(_) => {
                self.running = false;
                self.status = self.last_stop_message()
                    .unwrap_or_else(|| "VM halted. Press 'x' to reset.".into());
            }
        }
    }

    /// Undo the last step.
    pub fn step_back(&mut self) {
        self.running = false;
        let result = self.vm.step_back();
        self.events.drain();
        self.status = match result {
            Ok(()) => format!("Stepped back to PC={:03} ({} left)", self.vm.pc(), self.vm.history_len()),
            Err(e) => e.to_string(),
        };
    }

    /// Start continuous execution.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if self.running {
            self.step();
        }
    }

    pub fn pause(&mut self) {
        self.running = false;
        self.status = "Paused.".into();
    }

    /// Toggle breakpoint at the selected address.
    pub fn toggle_breakpoint(&mut self) {
        let addr = self.selected_addr;
        self.status = if self.vm.debug_mut().breakpoints.toggle(addr) {
            format!("Set breakpoint at {:03}", addr)
        } else {
            format!("Removed breakpoint at {:03}", addr)
        };
    }

    /// Toggle write protection of the selected address.
    pub fn toggle_protection(&mut self) {
        let addr = self.selected_addr;
        let mem = self.vm.memory_mut();
        self.status = if mem.unprotect(addr) {
            format!("Unprotected {:03}", addr)
        } else {
            match mem.protect(addr) {
                Ok(()) => format!("Protected {:03}", addr),
                Err(e) => e.to_string(),
            }
        };
    }

    pub fn toggle_heatmap(&mut self) {
        self.show_heatmap = !self.show_heatmap;
        self.vm.set_heatmap_enabled(self.show_heatmap || self.vm.config().heatmap_enabled);
        self.status = if self.show_heatmap { "Heat map on." } else { "Heat map off." }.into();
    }

    /// Reset the VM and reload the program.
    pub fn reset(&mut self) {
        self.vm.load_words(&self.program);
        self.events.drain();
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    pub fn select(&mut self, delta: isize) {
        let last = self.vm.memory().len() - 1;
        self.selected_addr = self.selected_addr.saturating_add_signed(delta).min(last);
    }

    /// Make sure the selected address is inside the visible memory window.
    pub fn scroll_to_selection(&mut self, visible_rows: usize) {
        if self.selected_addr < self.mem_scroll {
            self.mem_scroll = self.selected_addr;
        } else if visible_rows > 0 && self.selected_addr >= self.mem_scroll + visible_rows {
            self.mem_scroll = self.selected_addr + 1 - visible_rows;
        }
    }

    fn last_stop_message(&self) -> Option<String> {
        self.events.drain().into_iter().rev().find_map(|event| match event {
            VmEvent::Halt(message) => Some(message),
            VmEvent::Error(message) => Some(format!("Error: {}", message)),
            VmEvent::StateChange { .. } => None,
        })
    }

    /// Get disassembly around current PC: (address, text, is_current).
    pub fn get_disassembly(&self, lines: usize) -> Vec<(usize, String, bool)> {
        let cells = self.vm.memory().cells();
        let pc = self.vm.pc();
        let start = pc.saturating_sub(lines / 2);

        (start..cells.len())
            .take(lines)
            .map(|addr| (addr, disassemble_at(cells, addr).0, addr == pc))
            .collect()
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Vec<i64>, config: VmConfig, tick: Duration) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(program, config);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &mut app);
        })?;

        if event::poll(tick)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('u') => app.step_back(),
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => app.pause(),
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('w') => app.toggle_protection(),
                        KeyCode::Char('h') => app.toggle_heatmap(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => app.select(-1),
                        KeyCode::Down => app.select(1),
                        KeyCode::PageUp => app.select(-9),
                        KeyCode::PageDown => app.select(9),
                        _ => {}
                    }
                }
            }
        }

        // Tick for continuous running
        app.tick();

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(program: &[i64]) -> DebuggerApp {
        DebuggerApp::new(program.to_vec(), VmConfig::default())
    }

    #[test]
    fn test_tick_stops_at_halt() {
        let mut app = app(&[9, 9, 0]);
        app.run();
        for _ in 0..10 {
            app.tick();
        }
        assert!(!app.running);
        assert_eq!(app.vm.accumulator(), 2);
        assert_eq!(app.status, "Halt instruction (0) encountered");
    }

    #[test]
    fn test_breakpoint_stops_driver() {
        let mut app = app(&[9, 9, 9, 0]);
        app.selected_addr = 2;
        app.toggle_breakpoint();
        app.run();
        for _ in 0..10 {
            app.tick();
        }
        assert!(!app.running);
        assert!(app.vm.is_paused());
        assert_eq!(app.vm.accumulator(), 2);
        assert_eq!(app.status, "Breakpoint hit at address 2");
    }

    #[test]
    fn test_error_status() {
        let mut app = app(&[-7]);
        app.step();
        assert_eq!(app.status, "Error: Return with empty call stack");
    }

    #[test]
    fn test_manual_steps_do_not_accumulate_events() {
        let mut app = app(&[9, 9, 9, 0]);
        app.step();
        app.step();
        assert!(app.events.is_empty());
        app.step_back();
        assert!(app.events.is_empty());
        assert_eq!(app.vm.accumulator(), 1);
    }

    #[test]
    fn test_reset_reloads() {
        let mut app = app(&[9, 0]);
        app.step();
        app.reset();
        assert_eq!(app.vm.accumulator(), 0);
        assert_eq!(app.vm.memory().peek(0), Some(9));
    }

    #[test]
    fn test_disassembly_window() {
        let app = app(&[1, 3, 0]);
        let lines = app.get_disassembly(3);
        assert_eq!(lines[0], (0, "ADD 3".to_string(), true));
    }
}
