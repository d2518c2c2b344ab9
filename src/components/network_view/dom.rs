//! Browser resource handles that release themselves on drop.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, Event, EventTarget, HtmlCanvasElement, HtmlElement, MouseEvent, WheelEvent,
	Window,
};

use super::backend::{InteractiveScene, PointerAction, PointerPosition, PointerSink};
use super::error::EngineError;
use super::highlight::SceneStyle;
use super::types::NodeId;

pub(crate) fn window() -> Result<Window, EngineError> {
	web_sys::window().ok_or_else(|| EngineError::RenderSetup("no window".into()))
}

/// Append a canvas filling the container's width and acquire its 2D context.
///
/// On failure the canvas is removed again so nothing is left mounted.
pub(crate) fn create_canvas(
	container: &HtmlElement,
	height: f64,
) -> Result<(HtmlCanvasElement, CanvasRenderingContext2d), EngineError> {
	let setup = |e: JsValue| EngineError::from_js(EngineError::RenderSetup, &e);
	let document = window()?
		.document()
		.ok_or_else(|| EngineError::RenderSetup("no document".into()))?;
	let canvas: HtmlCanvasElement = document
		.create_element("canvas")
		.map_err(setup)?
		.dyn_into()
		.map_err(|_| EngineError::RenderSetup("canvas element cast failed".into()))?;

	let width = match container.client_width() {
		w if w > 0 => w as u32,
		_ => 800,
	};
	canvas.set_width(width);
	canvas.set_height(height as u32);
	canvas.set_class_name("network-canvas");
	let _ = canvas.style().set_property("display", "block");
	container.append_child(&canvas).map_err(setup)?;

	let context = canvas
		.get_context("2d")
		.map_err(setup)
		.and_then(|ctx| ctx.ok_or_else(|| EngineError::RenderSetup("2d context unavailable".into())))
		.and_then(|ctx| {
			ctx.dyn_into::<CanvasRenderingContext2d>()
				.map_err(|_| EngineError::RenderSetup("2d context cast failed".into()))
		});
	match context {
		Ok(ctx) => Ok((canvas, ctx)),
		Err(e) => {
			canvas.remove();
			Err(e)
		}
	}
}

/// Mouse position relative to the canvas' top-left corner.
fn pointer_position(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> PointerPosition {
	let rect = canvas.get_bounding_client_rect();
	PointerPosition {
		x: ev.client_x() as f64 - rect.left(),
		y: ev.client_y() as f64 - rect.top(),
	}
}

/// A `requestAnimationFrame` loop. Dropping the handle cancels the pending
/// frame and frees the callback.
pub struct AnimationLoop {
	frame_id: Rc<Cell<Option<i32>>>,
	callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
}

impl AnimationLoop {
	pub fn start(mut frame: impl FnMut() + 'static) -> Result<Self, EngineError> {
		let window = window()?;
		let frame_id = Rc::new(Cell::new(None));
		let callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));

		let (id_inner, callback_inner) = (frame_id.clone(), Rc::downgrade(&callback));
		*callback.borrow_mut() = Some(Closure::new(move || {
			id_inner.set(None);
			frame();
			let Some(callback) = callback_inner.upgrade() else {
				return;
			};
			if let (Some(win), Some(cb)) = (web_sys::window(), callback.borrow().as_ref()) {
				id_inner.set(win.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
			}
		}));

		if let Some(cb) = callback.borrow().as_ref() {
			let id = window
				.request_animation_frame(cb.as_ref().unchecked_ref())
				.map_err(|e| EngineError::from_js(EngineError::RenderSetup, &e))?;
			frame_id.set(Some(id));
		}
		Ok(Self { frame_id, callback })
	}
}

impl Drop for AnimationLoop {
	fn drop(&mut self) {
		if let (Some(id), Some(win)) = (self.frame_id.take(), web_sys::window()) {
			let _ = win.cancel_animation_frame(id);
		}
		self.callback.borrow_mut().take();
	}
}

/// An event listener that unregisters itself on drop.
pub struct DomListener {
	target: EventTarget,
	event: &'static str,
	callback: Closure<dyn FnMut(Event)>,
}

impl DomListener {
	/// Listen for `event` on `target`, delivering events that cast to `E`.
	pub fn new<E: JsCast + 'static>(
		target: &EventTarget,
		event: &'static str,
		mut handler: impl FnMut(E) + 'static,
	) -> Result<Self, EngineError> {
		let callback = Closure::<dyn FnMut(Event)>::new(move |ev: Event| {
			if let Ok(ev) = ev.dyn_into::<E>() {
				handler(ev);
			}
		});
		target
			.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
			.map_err(|e| EngineError::from_js(EngineError::RenderSetup, &e))?;
		Ok(Self {
			target: target.clone(),
			event,
			callback,
		})
	}
}

impl Drop for DomListener {
	fn drop(&mut self) {
		let _ = self
			.target
			.remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
	}
}

/// A canvas, its scene and everything that keeps the scene live: the frame
/// loop plus pointer and resize listeners.
pub(crate) struct MountedCanvas<S> {
	canvas: HtmlCanvasElement,
	scene: Rc<RefCell<S>>,
	frame: AnimationLoop,
	listeners: Vec<DomListener>,
}

impl<S: InteractiveScene + 'static> MountedCanvas<S> {
	/// Wire pointer input on `canvas` into `scene` and call `draw` every frame.
	///
	/// On failure the canvas is removed so nothing is left mounted.
	pub fn start(
		container: &HtmlElement,
		canvas: HtmlCanvasElement,
		scene: S,
		sink: &PointerSink,
		mut draw: impl FnMut(&mut S) + 'static,
	) -> Result<Self, EngineError> {
		let scene = Rc::new(RefCell::new(scene));
		let started = listen(container, &canvas, &scene, sink).and_then(|listeners| {
			let scene_frame = scene.clone();
			let frame = AnimationLoop::start(move || {
				if let Ok(mut scene) = scene_frame.try_borrow_mut() {
					draw(&mut *scene);
				}
			})?;
			Ok((frame, listeners))
		});
		match started {
			Ok((frame, listeners)) => Ok(Self {
				canvas,
				scene,
				frame,
				listeners,
			}),
			Err(e) => {
				canvas.remove();
				Err(e)
			}
		}
	}

	pub fn pick(&self, pointer: PointerPosition) -> Option<NodeId> {
		self.scene.try_borrow().ok()?.hit(pointer.x, pointer.y)
	}

	pub fn recolor(&self, style: &SceneStyle) {
		match self.scene.try_borrow_mut() {
			Ok(mut scene) => scene.restyle(style),
			Err(_) => warn!("epidemic-view: {} scene busy, recolor skipped", S::LABEL),
		}
	}

	/// Stop the frame loop and listeners, then detach the canvas.
	pub fn remove(self) {
		let Self {
			canvas,
			scene,
			frame,
			listeners,
		} = self;
		drop(frame);
		drop(listeners);
		drop(scene);
		canvas.remove();
		debug!("epidemic-view: {} view torn down", S::LABEL);
	}
}

fn forward(sink: &PointerSink, action: Option<PointerAction>) {
	if let Some(action) = action {
		sink(action);
	}
}

fn listen<S: InteractiveScene + 'static>(
	container: &HtmlElement,
	canvas: &HtmlCanvasElement,
	scene: &Rc<RefCell<S>>,
	sink: &PointerSink,
) -> Result<Vec<DomListener>, EngineError> {
	let target: &EventTarget = canvas.as_ref();
	let mut listeners = Vec::with_capacity(6);

	let (s, c) = (scene.clone(), canvas.clone());
	listeners.push(DomListener::new(target, "mousedown", move |ev: MouseEvent| {
		let p = pointer_position(&c, &ev);
		s.borrow_mut().press(p.x, p.y);
	})?);

	let (s, c, sink_move) = (scene.clone(), canvas.clone(), sink.clone());
	listeners.push(DomListener::new(target, "mousemove", move |ev: MouseEvent| {
		let p = pointer_position(&c, &ev);
		let action = s.borrow_mut().drag_to(p.x, p.y);
		let cursor = match s.borrow().hover_target() {
			Some(_) => "pointer",
			None => S::IDLE_CURSOR,
		};
		let _ = c.style().set_property("cursor", cursor);
		// The scene borrow is released before the session sees the action.
		forward(&sink_move, action);
	})?);

	let (s, c, sink_up) = (scene.clone(), canvas.clone(), sink.clone());
	listeners.push(DomListener::new(target, "mouseup", move |ev: MouseEvent| {
		let p = pointer_position(&c, &ev);
		let action = s.borrow_mut().release(p.x, p.y);
		forward(&sink_up, action);
	})?);

	let (s, sink_leave) = (scene.clone(), sink.clone());
	listeners.push(DomListener::new(target, "mouseleave", move |_: MouseEvent| {
		let action = s.borrow_mut().leave();
		forward(&sink_leave, action);
	})?);

	let (s, c) = (scene.clone(), canvas.clone());
	listeners.push(DomListener::new(target, "wheel", move |ev: WheelEvent| {
		ev.prevent_default();
		let p = pointer_position(&c, &ev);
		s.borrow_mut().scroll(p.x, p.y, ev.delta_y());
	})?);

	let (s, c, container) = (scene.clone(), canvas.clone(), container.clone());
	let window = window()?;
	listeners.push(DomListener::new(window.as_ref(), "resize", move |_: Event| {
		let width = container.client_width();
		if width > 0 && width as u32 != c.width() {
			c.set_width(width as u32);
			s.borrow_mut().fit(width as f64, c.height() as f64);
		}
	})?);

	Ok(listeners)
}

/// Seed for per-mount randomness.
pub fn fresh_seed() -> u64 {
	let hi = (js_sys::Math::random() * u32::MAX as f64) as u64;
	let lo = (js_sys::Math::random() * u32::MAX as f64) as u64;
	(hi << 32) | lo
}
