//! The "engine is thinking" ticker, backed by `setInterval`.

use js_sys::Date;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

use weiqi::Status;

use crate::page;

const TICK_MS: i32 = 500;

#[derive(Default)]
pub struct ThinkingInterval {
    running: Option<(i32, Closure<dyn FnMut()>)>,
}

impl ThinkingInterval {
    /// Reports `Status::EngineThinking` right away and then every half
    /// second. A running ticker is replaced.
    pub fn start(&mut self, report: impl Fn(&Status) + 'static) -> Result<(), JsValue> {
        self.stop();
        let started = Date::now();
        let tick = move || {
            let secs = ((Date::now() - started) / 1000.0).floor() as u64;
            report(&Status::EngineThinking(secs));
        };
        tick();
        let callback = Closure::<dyn FnMut()>::new(tick);
        let id = page::window()?.set_interval_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            TICK_MS,
        )?;
        self.running = Some((id, callback));
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some((id, _callback)) = self.running.take() {
            if let Ok(window) = page::window() {
                window.clear_interval_with_handle(id);
            }
        }
    }
}

impl Drop for ThinkingInterval {
    fn drop(&mut self) {
        self.stop();
    }
}
