/* src/store/event.rs */

/// Default event channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// How the initial document was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
	/// Read from persistence and reconciled.
	Stored,
	/// Nothing stored yet; defaults used.
	Missing,
	/// The stored document was unreadable; defaults used.
	Invalid,
	/// No persistence configured.
	Ephemeral,
}

/// Notable things happening to a store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
	/// The initial document is in place.
	Loaded {
		kind: LoadKind,
		dropped: Vec<String>,
		conflicts: Vec<String>,
	},
	/// The document changed.
	Changed,
	/// The document was replaced from a re-read of persistence.
	Reloaded,
	Persisted { location: String },
	/// A write failed. The in-memory document is kept as is.
	PersistFailed { location: String, error: String },
	/// A registered effect failed.
	EffectFailed { key: String, error: String },
}

#[derive(Clone)]
pub(crate) struct Events {
	#[cfg(feature = "events")]
	tx: tokio::sync::broadcast::Sender<StoreEvent>,
}

impl Events {
	pub(crate) fn new(_capacity: usize) -> Self {
		Self {
			#[cfg(feature = "events")]
			tx: tokio::sync::broadcast::channel(_capacity.max(1)).0,
		}
	}

	/// Sends the event built by `event`. The builder only runs when events
	/// are compiled in.
	pub(crate) fn emit(&self, event: impl FnOnce() -> StoreEvent) {
		#[cfg(feature = "events")]
		{
			let _ = self.tx.send(event());
		}
		#[cfg(not(feature = "events"))]
		{
			let _ = event;
		}
	}

	#[cfg(feature = "events")]
	pub(crate) fn subscribe(&self) -> tokio::sync::broadcast::Receiver<StoreEvent> {
		self.tx.subscribe()
	}
}

/// Store events as a `Stream`. Lagging consumers see
/// `BroadcastStreamRecvError::Lagged` items.
#[cfg(feature = "stream")]
pub struct EventStream {
	inner: tokio_stream::wrappers::BroadcastStream<StoreEvent>,
}

#[cfg(feature = "stream")]
impl EventStream {
	pub(crate) fn new(rx: tokio::sync::broadcast::Receiver<StoreEvent>) -> Self {
		Self {
			inner: tokio_stream::wrappers::BroadcastStream::new(rx),
		}
	}
}

#[cfg(feature = "stream")]
impl futures_util::Stream for EventStream {
	type Item = Result<StoreEvent, tokio_stream::wrappers::errors::BroadcastStreamRecvError>;

	fn poll_next(
		mut self: std::pin::Pin<&mut Self>,
		cx: &mut std::task::Context<'_>,
	) -> std::task::Poll<Option<Self::Item>> {
		futures_util::Stream::poll_next(std::pin::Pin::new(&mut self.inner), cx)
	}
}
