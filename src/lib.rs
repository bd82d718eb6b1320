pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod utils;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

pub use config::SceneConfig;
pub use context::SceneContext;
pub use error::{ConfigError, RenderError, StartupError};

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::convert::FromWasmAbi;
    use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
    use web_sys::{Document, Event, EventTarget, HtmlCanvasElement, KeyboardEvent, MouseEvent, Window};

    use crate::clock::Clock;
    use crate::controller::input::{wasm as web_input, InputEvent};
    use crate::error::{RenderError, StartupError};
    use crate::model::ViewportState;
    use crate::view::{GpuContext, Renderer};
    use crate::{logging, SceneConfig, SceneContext};

    /// Id of an optional `<script type="text/toml">` element holding a
    /// scene config.
    const CONFIG_ELEMENT_ID: &str = "tumble-config";

    #[wasm_bindgen(start)]
    pub async fn start() -> Result<(), JsValue> {
        logging::init();
        setup_app().await.map_err(|e| {
            tracing::error!("startup failed: {e}");
            js_error(e.to_string())
        })
    }

    /// Main application setup for WASM
    async fn setup_app() -> Result<(), StartupError> {
        let (window, document, canvas) = init_canvas().map_err(host_error)?;
        let config = load_config(&document)?;

        let mut ctx = SceneContext::new(config)?;
        let (width, height, dpr) = window_metrics(&window);
        if width > 0 && height > 0 {
            ctx.viewport.width = width;
            ctx.viewport.height = height;
        }
        ctx.viewport.pixel_ratio = ctx.viewport.effective_pixel_ratio(dpr);
        apply_canvas_size(&canvas, &ctx.viewport);

        let (pw, ph) = ctx.viewport.drawable_size();
        let gpu = GpuContext::for_canvas(&canvas, pw, ph).await?;
        let mut renderer = Renderer::new(gpu);
        ctx.attach_renderer(&mut renderer, width, height, dpr);

        let ctx = Rc::new(RefCell::new(ctx));
        let renderer = Rc::new(RefCell::new(renderer));

        setup_listeners(&window, &document, &canvas, ctx.clone(), renderer.clone()).map_err(host_error)?;

        let clock = Clock::start();
        let frame = RcCellCallback::new(window.clone(), move || {
            let elapsed = clock.elapsed_seconds();
            match ctx.borrow_mut().tick(elapsed, &mut *renderer.borrow_mut()) {
                Ok(_) => true,
                Err(RenderError::Surface(e)) => {
                    tracing::error!("fatal surface error, stopping frame loop: {e}");
                    false
                }
            }
        });
        frame.start().map_err(host_error)?;
        tracing::info!("frame loop started");
        Ok(())
    }

    fn load_config(document: &Document) -> Result<SceneConfig, StartupError> {
        let source = document
            .get_element_by_id(CONFIG_ELEMENT_ID)
            .and_then(|el| el.text_content())
            .filter(|s| !s.trim().is_empty());
        match source {
            Some(toml) => {
                tracing::info!("using scene config from #{CONFIG_ELEMENT_ID}");
                Ok(SceneConfig::from_toml_str(&toml)?)
            }
            None => Ok(SceneConfig::default()),
        }
    }

    /// Logical window size and device pixel ratio.
    fn window_metrics(window: &Window) -> (u32, u32, f32) {
        let dim = |v: Result<JsValue, JsValue>| {
            v.ok().and_then(|v| v.as_f64()).map(|v| v.max(0.0) as u32).unwrap_or(0)
        };
        (dim(window.inner_width()), dim(window.inner_height()), window.device_pixel_ratio() as f32)
    }

    /// Backing store at drawable size, CSS box at logical size.
    fn apply_canvas_size(canvas: &HtmlCanvasElement, viewport: &ViewportState) {
        let (pw, ph) = viewport.drawable_size();
        canvas.set_width(pw);
        canvas.set_height(ph);
        let style = format!(
            "display:block;width:{}px;height:{}px;touch-action:none",
            viewport.width, viewport.height
        );
        if let Err(e) = canvas.set_attribute("style", &style) {
            tracing::warn!(?e, "failed to style canvas");
        }
    }

    fn listen<E>(target: &EventTarget, kind: &str, handler: impl FnMut(E) + 'static) -> Result<(), JsValue>
    where
        E: FromWasmAbi + 'static,
    {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(E)>);
        target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn setup_listeners(
        window: &Window,
        document: &Document,
        canvas: &HtmlCanvasElement,
        ctx: Rc<RefCell<SceneContext>>,
        renderer: Rc<RefCell<Renderer>>,
    ) -> Result<(), JsValue> {
        // Resize: applied synchronously so the next frame already uses it.
        {
            let ctx = ctx.clone();
            let window_for_size = window.clone();
            let canvas = canvas.clone();
            listen(window, "resize", move |_e: Event| {
                let (width, height, dpr) = window_metrics(&window_for_size);
                let mut ctx = ctx.borrow_mut();
                ctx.on_resize(&mut *renderer.borrow_mut(), width, height, dpr);
                apply_canvas_size(&canvas, &ctx.viewport);
            })?;
        }

        for (kind, is_down) in [("keydown", true), ("keyup", false)] {
            let ctx = ctx.clone();
            listen(document, kind, move |e: KeyboardEvent| {
                let event = web_input::keyboard_event_to_input(&e, is_down);
                if ctx.borrow_mut().on_input(&event) {
                    e.prevent_default();
                }
            })?;
        }

        {
            let ctx = ctx.clone();
            listen(canvas, "mousedown", move |e: MouseEvent| {
                ctx.borrow_mut().on_input(&web_input::mouse_button_to_input(&e, true));
            })?;
        }

        // Move and release are tracked on the document so a drag that
        // leaves the canvas still ends.
        {
            let ctx = ctx.clone();
            listen(document, "mousemove", move |e: MouseEvent| {
                ctx.borrow_mut().on_input(&web_input::mouse_move_to_input(&e));
            })?;
        }
        {
            let ctx = ctx.clone();
            listen(document, "mouseup", move |e: MouseEvent| {
                ctx.borrow_mut().on_input(&web_input::mouse_button_to_input(&e, false));
            })?;
        }

        {
            let ctx = ctx.clone();
            listen(canvas, "wheel", move |e: Event| {
                if let Some(event) = web_input::mouse_wheel_to_input(&e) {
                    ctx.borrow_mut().on_input(&event);
                    e.prevent_default();
                }
            })?;
        }

        listen(canvas, "contextmenu", |e: MouseEvent| e.prevent_default())?;

        listen(window, "blur", move |_e: Event| {
            ctx.borrow_mut().on_input(&InputEvent::FocusLost);
        })?;

        Ok(())
    }

    fn init_canvas() -> Result<(Window, Document, HtmlCanvasElement), JsValue> {
        let window = web_sys::window().ok_or(js_error("no global `window`"))?;
        let document = window.document().ok_or(js_error("no document on window"))?;
        let body = document.body().ok_or(js_error("no body on document"))?;
        let canvas_el = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| js_error("failed to create canvas"))?;
        body.set_attribute("style", "margin:0;overflow:hidden")?;
        body.append_child(&canvas_el)?;
        Ok((window, document, canvas_el))
    }

    fn js_error<E: Into<String>>(msg: E) -> JsValue {
        JsValue::from_str(&msg.into())
    }

    fn host_error(e: JsValue) -> StartupError {
        StartupError::Host(format!("{e:?}"))
    }

    /// requestAnimationFrame loop. The callback returns false to stop.
    struct RcCellCallback {
        inner: Rc<RefCell<Box<dyn FnMut() -> bool>>>,
        window: Window,
    }

    impl RcCellCallback {
        fn new(window: Window, f: impl FnMut() -> bool + 'static) -> Self {
            Self {
                inner: Rc::new(RefCell::new(Box::new(f))),
                window,
            }
        }

        fn start(self) -> Result<(), JsValue> {
            let inner = self.inner.clone();
            let window = self.window.clone();

            let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
            let callback_clone = callback.clone();

            *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
                if !inner.borrow_mut().as_mut()() {
                    return;
                }

                // Recursively schedule next frame
                if let Some(cb) = callback_clone.borrow().as_ref() {
                    if let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                        tracing::error!(?e, "requestAnimationFrame failed");
                    }
                }
            }) as Box<dyn FnMut()>));

            if let Some(cb) = callback.borrow().as_ref() {
                self.window.request_animation_frame(cb.as_ref().unchecked_ref())?;
            }

            // Leak the closure to keep it alive
            std::mem::forget(callback);
            Ok(())
        }
    }
}
