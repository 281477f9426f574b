//! Pending-request indicator shared by concurrent HTTP exchanges.
//!
//! Each request holds a [`PendingGuard`] for as long as it is in flight. The
//! indicator is visible while at least one guard is alive, and the optional
//! [`IndicatorSink`] hears only about visibility transitions.

use std::sync::Arc;

use parking_lot::Mutex;

/// Receives indicator visibility changes, e.g. to show a loading overlay.
pub trait IndicatorSink: Send + Sync {
	fn set_visible(&self, visible: bool);
}

/// Reference-counted visibility flag.
#[derive(Clone, Default)]
pub struct PendingIndicator {
	inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
	in_flight: Mutex<usize>,
	sink: Option<Arc<dyn IndicatorSink>>,
}

impl PendingIndicator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Indicator that reports transitions to `sink`.
	pub fn with_sink(sink: Arc<dyn IndicatorSink>) -> Self {
		Self {
			inner: Arc::new(Inner {
				in_flight: Mutex::new(0),
				sink: Some(sink),
			}),
		}
	}

	/// Marks one request as in flight until the guard drops.
	pub fn begin(&self) -> PendingGuard {
		let mut count = self.inner.in_flight.lock();
		*count += 1;
		if *count == 1 {
			self.inner.notify(true);
		}
		PendingGuard {
			inner: Arc::clone(&self.inner),
		}
	}

	pub fn in_flight(&self) -> usize {
		*self.inner.in_flight.lock()
	}

	pub fn is_visible(&self) -> bool {
		self.in_flight() > 0
	}
}

impl Inner {
	// Called with the count locked so transitions reach the sink in order.
	fn notify(&self, visible: bool) {
		if let Some(sink) = &self.sink {
			sink.set_visible(visible);
		}
	}
}

/// Keeps the indicator visible while alive.
#[must_use = "the request stops counting as pending when the guard drops"]
pub struct PendingGuard {
	inner: Arc<Inner>,
}

impl Drop for PendingGuard {
	fn drop(&mut self) {
		let mut count = self.inner.in_flight.lock();
		*count = count.saturating_sub(1);
		if *count == 0 {
			self.inner.notify(false);
		}
	}
}
