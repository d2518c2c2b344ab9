//! Timers and local task spawning.
//!
//! The session never touches `window` directly for cadence; it asks a
//! [`Scheduler`]. The browser implementation is `setInterval` plus
//! `spawn_local`.

use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use super::error::EngineError;

/// A future the scheduler drives on the current thread.
pub type LocalTask = Pin<Box<dyn Future<Output = ()>>>;

/// A running interval. Cancelling twice is a no-op.
pub trait IntervalHandle {
	fn cancel(&self);
}

pub trait Scheduler {
	/// Call `tick` every `period_ms` until the handle is cancelled.
	fn every(
		&self,
		period_ms: u32,
		tick: Box<dyn FnMut()>,
	) -> Result<Box<dyn IntervalHandle>, EngineError>;

	/// Run `task` to completion in the background.
	fn spawn(&self, task: LocalTask);
}

/// [`Scheduler`] on the browser event loop.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserScheduler;

struct BrowserInterval {
	id: Cell<Option<i32>>,
	_tick: Closure<dyn FnMut()>,
}

impl IntervalHandle for BrowserInterval {
	fn cancel(&self) {
		if let (Some(id), Some(window)) = (self.id.take(), web_sys::window()) {
			window.clear_interval_with_handle(id);
		}
	}
}

impl Drop for BrowserInterval {
	fn drop(&mut self) {
		self.cancel();
	}
}

impl Scheduler for BrowserScheduler {
	fn every(
		&self,
		period_ms: u32,
		tick: Box<dyn FnMut()>,
	) -> Result<Box<dyn IntervalHandle>, EngineError> {
		let window = web_sys::window().ok_or_else(|| EngineError::Scheduler("no window".into()))?;
		let tick = Closure::wrap(tick);
		let id = window
			.set_interval_with_callback_and_timeout_and_arguments_0(
				tick.as_ref().unchecked_ref(),
				period_ms as i32,
			)
			.map_err(|e| EngineError::from_js(EngineError::Scheduler, &e))?;
		Ok(Box::new(BrowserInterval {
			id: Cell::new(Some(id)),
			_tick: tick,
		}))
	}

	fn spawn(&self, task: LocalTask) {
		wasm_bindgen_futures::spawn_local(task);
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;

	#[derive(Default)]
	struct TimerSlot {
		tick: Option<Box<dyn FnMut()>>,
		period_ms: u32,
		cancelled: bool,
	}

	/// Deterministic scheduler: intervals fire only when the test says so and
	/// spawned tasks run to completion immediately.
	#[derive(Clone, Default)]
	pub(crate) struct ManualScheduler {
		timers: Rc<RefCell<Vec<Rc<RefCell<TimerSlot>>>>>,
		pub cancels: Rc<Cell<usize>>,
	}

	struct ManualHandle {
		slot: Rc<RefCell<TimerSlot>>,
		cancels: Rc<Cell<usize>>,
	}

	impl IntervalHandle for ManualHandle {
		fn cancel(&self) {
			let mut slot = self.slot.borrow_mut();
			if !slot.cancelled {
				slot.cancelled = true;
				self.cancels.set(self.cancels.get() + 1);
			}
		}
	}

	impl ManualScheduler {
		/// Number of intervals that are registered and not cancelled.
		pub(crate) fn active(&self) -> usize {
			self.timers.borrow().iter().filter(|t| !t.borrow().cancelled).count()
		}

		pub(crate) fn period_of_active(&self) -> Option<u32> {
			self.timers
				.borrow()
				.iter()
				.find(|t| !t.borrow().cancelled)
				.map(|t| t.borrow().period_ms)
		}

		/// Fire every live interval once.
		pub(crate) fn fire(&self) {
			let live: Vec<_> = self
				.timers
				.borrow()
				.iter()
				.filter(|t| !t.borrow().cancelled)
				.cloned()
				.collect();
			for slot in live {
				// Take the callback out so it can cancel its own slot.
				let tick = slot.borrow_mut().tick.take();
				if let Some(mut tick) = tick {
					tick();
					slot.borrow_mut().tick = Some(tick);
				}
			}
		}
	}

	impl Scheduler for ManualScheduler {
		fn every(
			&self,
			period_ms: u32,
			tick: Box<dyn FnMut()>,
		) -> Result<Box<dyn IntervalHandle>, EngineError> {
			let slot = Rc::new(RefCell::new(TimerSlot {
				tick: Some(tick),
				period_ms,
				cancelled: false,
			}));
			self.timers.borrow_mut().push(slot.clone());
			Ok(Box::new(ManualHandle {
				slot,
				cancels: self.cancels.clone(),
			}))
		}

		fn spawn(&self, task: LocalTask) {
			pollster::block_on(task);
		}
	}

	#[test]
	fn manual_intervals_fire_until_cancelled() {
		let scheduler = ManualScheduler::default();
		let hits = Rc::new(Cell::new(0));
		let counter = hits.clone();
		let handle = scheduler
			.every(1000, Box::new(move || counter.set(counter.get() + 1)))
			.unwrap();
		scheduler.fire();
		scheduler.fire();
		handle.cancel();
		handle.cancel();
		scheduler.fire();
		assert_eq!(hits.get(), 2);
		assert_eq!(scheduler.cancels.get(), 1);
		assert_eq!(scheduler.active(), 0);
	}
}
