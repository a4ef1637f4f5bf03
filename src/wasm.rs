//! WebAssembly bindings for the VM.
//!
//! This module provides JavaScript-friendly wrappers around the core VM.
//! The browser owns the run loop: it calls `step()` from a timer and stops
//! when `step()` returns false.

use wasm_bindgen::prelude::*;
use crate::asm::assembler::{assemble, to_program_text};
use crate::asm::disasm::disassemble_at;
use crate::config::VmConfig;
use crate::debug::{ConditionalBreakpoint, Watch};
use crate::ternary::{from_balanced_ternary, to_balanced_ternary};
use crate::vm::{MemorySize, StepOutcome, Vm, VmObserver, VmSnapshot};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Forwards VM callbacks to JavaScript functions.
struct JsObserver {
    on_state_change: Option<js_sys::Function>,
    on_error: Option<js_sys::Function>,
    on_halt: Option<js_sys::Function>,
}

impl VmObserver for JsObserver {
    fn on_state_change(&mut self, _snapshot: &VmSnapshot) {
        if let Some(f) = &self.on_state_change {
            let _ = f.call0(&JsValue::NULL);
        }
    }

    fn on_error(&mut self, message: &str) {
        if let Some(f) = &self.on_error {
            let _ = f.call1(&JsValue::NULL, &JsValue::from_str(message));
        }
    }

    fn on_halt(&mut self, message: &str) {
        if let Some(f) = &self.on_halt {
            let _ = f.call1(&JsValue::NULL, &JsValue::from_str(message));
        }
    }
}

fn js_err(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

/// WebAssembly-friendly VM wrapper.
#[wasm_bindgen]
pub struct WasmVm {
    vm: Vm,
}

#[wasm_bindgen]
impl WasmVm {
    /// Create a VM. `memory_size` must be 27, 81 or 243.
    #[wasm_bindgen(constructor)]
    pub fn new(memory_size: usize) -> Result<WasmVm, JsError> {
        let memory_size = MemorySize::try_from(memory_size).map_err(js_err)?;
        Ok(Self { vm: Vm::with_config(VmConfig { memory_size, ..VmConfig::default() }) })
    }

    /// Create a VM from a JSON configuration.
    pub fn from_config(json: &str) -> Result<WasmVm, JsError> {
        let config = VmConfig::from_json(json).map_err(js_err)?;
        Ok(Self { vm: Vm::with_config(config) })
    }

    /// Attach JavaScript callbacks. Any of them may be null.
    pub fn set_callbacks(
        &mut self,
        on_state_change: Option<js_sys::Function>,
        on_error: Option<js_sys::Function>,
        on_halt: Option<js_sys::Function>,
    ) {
        self.vm.add_observer(Box::new(JsObserver { on_state_change, on_error, on_halt }));
    }

    /// Load ternary program text. Returns the number of words loaded.
    pub fn load(&mut self, text: &str) -> Result<usize, JsError> {
        self.vm.load_program(text).map_err(js_err)
    }

    /// Assemble mnemonic source and load it.
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let words = assemble(source).map_err(js_err)?;
        Ok(self.vm.load_words(&words))
    }

    /// Step one instruction. Returns false once the run has stopped.
    pub fn step(&mut self) -> bool {
        matches!(self.vm.step(), Ok(StepOutcome::Continue))
    }

    pub fn step_back(&mut self) -> Result<(), JsError> {
        self.vm.step_back().map_err(js_err)
    }

    pub fn reset(&mut self) {
        self.vm.reset();
    }

    pub fn resize(&mut self, memory_size: usize) -> Result<(), JsError> {
        let size = MemorySize::try_from(memory_size).map_err(js_err)?;
        self.vm.resize(size).map_err(js_err)
    }

    pub fn toggle_breakpoint(&mut self, addr: usize) -> bool {
        self.vm.debug_mut().breakpoints.toggle(addr)
    }

    /// Add a conditional breakpoint such as `acc >= 5` or `mem[3] == 0`.
    pub fn add_condition(&mut self, expr: &str) -> Result<(), JsError> {
        let condition: ConditionalBreakpoint = expr.parse().map_err(js_err)?;
        self.vm.debug_mut().breakpoints.add_condition(condition);
        Ok(())
    }

    pub fn remove_condition(&mut self, index: usize) -> bool {
        self.vm.debug_mut().breakpoints.remove_condition(index).is_some()
    }

    /// Add a watch such as `acc` or `mem[3] as counter`.
    pub fn add_watch(&mut self, expr: &str) -> Result<(), JsError> {
        let watch: Watch = expr.parse().map_err(js_err)?;
        self.vm.debug_mut().watches.add(watch);
        Ok(())
    }

    pub fn remove_watch(&mut self, index: usize) -> bool {
        self.vm.debug_mut().watches.remove(index).is_some()
    }

    /// Edit a memory word directly. Protection does not apply.
    pub fn set_memory(&mut self, addr: usize, value: i64) -> Result<(), JsError> {
        self.vm.memory_mut().poke(addr, value).map_err(js_err)
    }

    pub fn protect(&mut self, addr: usize) -> Result<(), JsError> {
        self.vm.memory_mut().protect(addr).map_err(js_err)
    }

    pub fn unprotect(&mut self, addr: usize) -> bool {
        self.vm.memory_mut().unprotect(addr)
    }

    pub fn set_history_enabled(&mut self, enabled: bool) {
        self.vm.set_history_enabled(enabled);
    }

    pub fn set_heatmap_enabled(&mut self, enabled: bool) {
        self.vm.set_heatmap_enabled(enabled);
    }

    pub fn is_running(&self) -> bool {
        self.vm.is_running()
    }

    pub fn accumulator(&self) -> i64 {
        self.vm.accumulator()
    }

    pub fn pc(&self) -> usize {
        self.vm.pc()
    }

    /// Disassembly of the instruction at `addr`.
    pub fn disassemble(&self, addr: usize) -> String {
        disassemble_at(self.vm.memory().cells(), addr).0
    }

    /// Full state snapshot as JSON.
    pub fn snapshot_json(&self) -> String {
        self.vm.snapshot().to_json()
    }
}

/// Convert an integer to balanced ternary.
#[wasm_bindgen]
pub fn wasm_to_ternary(value: i64) -> String {
    to_balanced_ternary(value)
}

/// Convert balanced ternary to an integer.
#[wasm_bindgen]
pub fn wasm_from_ternary(text: &str) -> Result<i64, JsError> {
    from_balanced_ternary(text).map_err(js_err)
}

/// Assemble source to loader-ready ternary program text.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<String, JsError> {
    let words = assemble(source).map_err(js_err)?;
    Ok(to_program_text(&words))
}
