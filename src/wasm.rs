//! WASM bindings for Logic Emu.
//!
//! This module provides JavaScript-friendly bindings so a browser diagram can
//! drive an emulation session and paint pin colors from its levels.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmSession } from 'logic_emu';
//!
//! await init();
//!
//! const netlist = `
//!   ENTRY a -> a_o
//!   NOT   n n_i -> n_o
//!   EXIT  x x_i
//!   a_o => n_i
//!   n_o => x_i
//! `;
//!
//! const session = new WasmSession(netlist, 250);
//! session.set_entry_level('a_o', 'HIGH');
//!
//! // Called from a timer every `delay_ms`
//! session.step();
//! for (const pin of session.pin_names()) {
//!   paint(pin, session.level(pin));
//! }
//! ```

use std::sync::Arc;

use wasm_bindgen::prelude::*;

use crate::circuit::Level;
use crate::engine::{EvalDelay, Session};
use crate::error::EmuError;
use crate::netlist;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn to_js(e: EmuError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// WASM-compatible emulation session.
///
/// Browsers have no blocking sleep, so continuous running is driven from
/// JavaScript: a timer calls [`step`](Self::step) every `delay_ms` while
/// [`is_running`](Self::is_running) holds.
#[wasm_bindgen]
pub struct WasmSession {
    session: Session,
}

#[wasm_bindgen]
impl WasmSession {
    /// Create a session from netlist text.
    ///
    /// # Arguments
    /// * `netlist` - The circuit description in netlist format
    /// * `delay_ms` - Pause between ticks when running; must not be negative
    #[wasm_bindgen(constructor)]
    pub fn new(netlist: &str, delay_ms: f64) -> Result<WasmSession, JsValue> {
        let parsed = netlist::parse(netlist).map_err(to_js)?;
        let graph = parsed.build_graph().map_err(to_js)?;
        let delay = EvalDelay::from_millis_f64(delay_ms).map_err(to_js)?;
        let config = parsed.options.scheduler_config().with_eval_delay(delay);
        let session = Session::with_config(Arc::new(graph), config).map_err(to_js)?;
        Ok(WasmSession { session })
    }

    /// Drive an ENTRY output pin with `HIGH`, `LOW` or `UNDEFINED`.
    #[wasm_bindgen]
    pub fn set_entry_level(&mut self, pin: &str, level: &str) -> Result<(), JsValue> {
        let level: Level = level.parse().map_err(|e: String| JsValue::from_str(&e))?;
        self.session.set_entry_level(pin, level).map_err(to_js)
    }

    /// Advance one tick and return the new tick counter.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<f64, JsValue> {
        self.session.step().map(|t| t as f64).map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn start(&mut self) -> Result<(), JsValue> {
        self.session.start().map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn pause(&mut self) -> Result<(), JsValue> {
        self.session.pause().map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn stop(&mut self) -> Result<(), JsValue> {
        self.session.stop().map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn reset(&mut self) -> Result<(), JsValue> {
        self.session.reset().map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn dispose(&mut self) -> Result<(), JsValue> {
        self.session.dispose().map_err(to_js)
    }

    /// Whether the JavaScript timer should keep stepping.
    #[wasm_bindgen(getter)]
    pub fn is_running(&self) -> bool {
        self.session.state() == crate::engine::SessionState::Running
    }

    /// Lifecycle state as text (`CREATED`, `RUNNING`, `PAUSED`, `DISPOSED`).
    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        self.session.state().to_string()
    }

    /// Pause between ticks in milliseconds.
    #[wasm_bindgen(getter)]
    pub fn delay_ms(&self) -> f64 {
        self.session.config().eval_delay.as_duration().as_secs_f64() * 1000.0
    }

    #[wasm_bindgen]
    pub fn tick(&self) -> Result<f64, JsValue> {
        self.session.tick().map(|t| t as f64).map_err(to_js)
    }

    /// Level of a pin as text.
    #[wasm_bindgen]
    pub fn level(&self, pin: &str) -> Result<String, JsValue> {
        self.session.level(pin).map(|l| l.to_string()).map_err(to_js)
    }

    /// Every pin id, in declaration order.
    #[wasm_bindgen]
    pub fn pin_names(&self) -> Vec<String> {
        self.session
            .graph()
            .pins()
            .iter()
            .map(|p| p.name.clone())
            .collect()
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
