/* src/signal/binding.rs */

//! Signals mirroring properties of host objects that announce their own
//! changes, such as a battery service or an audio endpoint.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;

use super::{Readable, ReadSignal, Signal, Subscription};

/// Identifies a handler registered on a [`PropertySource`].
pub type HandlerId = u64;

pub type NotifyHandler = Box<dyn Fn(Value) + Send + Sync>;

pub type DisposeHandler = Box<dyn FnOnce() + Send>;

/// A host object exposing named properties with change notification.
pub trait PropertySource: Send + Sync + 'static {
	/// Current value of `name`, or `Value::Null` if the object has no such property.
	fn property(&self, name: &str) -> Value;

	/// Calls `handler` with the new value each time `name` changes.
	fn connect_notify(&self, name: &str, handler: NotifyHandler) -> HandlerId;

	fn disconnect(&self, handler: HandlerId);

	/// Calls `handler` once when the object is destroyed. Objects without a
	/// destruction signal return `None`.
	fn connect_dispose(&self, _handler: DisposeHandler) -> Option<HandlerId> {
		None
	}
}

type BindingKey = (usize, String);

struct BindingInner {
	signal: Signal<Value>,
	source: Weak<dyn PropertySource>,
	property: String,
	handler: HandlerId,
	dispose_handler: Option<HandlerId>,
	connected: AtomicBool,
}

impl BindingInner {
	fn disconnect(&self) {
		if !self.connected.swap(false, Ordering::SeqCst) {
			return;
		}
		if let Some(source) = self.source.upgrade() {
			source.disconnect(self.handler);
			if let Some(id) = self.dispose_handler {
				source.disconnect(id);
			}
		}
		tracing::trace!(property = %self.property, "binding disconnected");
	}
}

impl Drop for BindingInner {
	fn drop(&mut self) {
		self.disconnect();
	}
}

/// A read-only signal tracking one property of a host object.
///
/// The native handler stays connected until the last clone is dropped or the
/// object is destroyed, whichever comes first.
#[derive(Clone)]
pub struct Binding {
	inner: Arc<BindingInner>,
}

impl Binding {
	pub fn get(&self) -> Arc<Value> {
		self.inner.signal.get()
	}

	pub fn get_untracked(&self) -> Arc<Value> {
		self.inner.signal.get_untracked()
	}

	pub fn subscribe(&self, f: impl Fn(&Value) + Send + Sync + 'static) -> Subscription {
		self.inner.signal.subscribe(f)
	}

	/// Read-only view of the backing signal. It keeps the last value after
	/// the binding goes away but receives no further updates.
	pub fn signal(&self) -> ReadSignal<Value> {
		self.inner.signal.read_only()
	}

	pub fn property(&self) -> &str {
		&self.inner.property
	}

	pub fn is_connected(&self) -> bool {
		self.inner.connected.load(Ordering::SeqCst)
	}

	pub fn ptr_eq(&self, other: &Binding) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}
}

impl fmt::Debug for Binding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Binding")
			.field("property", &self.inner.property)
			.field("value", &self.inner.signal.get_untracked())
			.field("connected", &self.is_connected())
			.finish()
	}
}

impl Readable<Value> for Binding {
	fn get(&self) -> Arc<Value> {
		Binding::get(self)
	}

	fn get_untracked(&self) -> Arc<Value> {
		Binding::get_untracked(self)
	}

	fn subscribe<F>(&self, f: F) -> Subscription
	where
		F: Fn(&Value) + Send + Sync + 'static,
	{
		Binding::subscribe(self, f)
	}
}

#[derive(Default)]
struct Registry {
	entries: Mutex<HashMap<BindingKey, Weak<BindingInner>>>,
	retained: Mutex<Vec<Arc<BindingInner>>>,
}

/// Deduplicating factory for [`Binding`]s.
///
/// Binding the same property of the same object twice returns the same
/// binding while the first one is alive, so a host object never carries more
/// than one native handler per property per registry.
#[derive(Clone, Default)]
pub struct Bindings {
	registry: Arc<Registry>,
}

impl Bindings {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn bind<S>(&self, source: &Arc<S>, property: &str) -> Binding
	where
		S: PropertySource,
	{
		let source: Arc<dyn PropertySource> = Arc::clone(source) as Arc<dyn PropertySource>;
		self.bind_dyn(&source, property)
	}

	pub fn bind_dyn(&self, source: &Arc<dyn PropertySource>, property: &str) -> Binding {
		let key: BindingKey = (identity(source), property.to_string());

		if let Some(existing) = self.lookup(&key) {
			return existing;
		}

		// Connecting may call back into the registry, so no lock is held here.
		let fresh = connect(source, property, key.clone(), Arc::downgrade(&self.registry));

		let mut entries = self.registry.entries.lock();
		if let Some(raced) = entries
			.get(&key)
			.and_then(Weak::upgrade)
			.filter(|inner| inner.connected.load(Ordering::SeqCst))
		{
			drop(entries);
			return Binding { inner: raced };
		}
		entries.insert(key, Arc::downgrade(&fresh));
		Binding { inner: fresh }
	}

	/// Like [`bind`](Self::bind), but the registry keeps the binding alive
	/// until the object is destroyed, even with no handle left.
	pub fn bind_retained<S>(&self, source: &Arc<S>, property: &str) -> Binding
	where
		S: PropertySource,
	{
		let binding = self.bind(source, property);
		let mut retained = self.registry.retained.lock();
		if !retained.iter().any(|kept| Arc::ptr_eq(kept, &binding.inner)) {
			retained.push(Arc::clone(&binding.inner));
		}
		binding
	}

	/// Number of live bindings.
	pub fn len(&self) -> usize {
		self.registry
			.entries
			.lock()
			.values()
			.filter(|weak| weak.strong_count() > 0)
			.count()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn lookup(&self, key: &BindingKey) -> Option<Binding> {
		let mut entries = self.registry.entries.lock();
		match entries.get(key).and_then(Weak::upgrade) {
			Some(inner) if inner.connected.load(Ordering::SeqCst) => Some(Binding { inner }),
			Some(_) | None => {
				entries.remove(key);
				None
			}
		}
	}
}

impl fmt::Debug for Bindings {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Bindings").field("live", &self.len()).finish()
	}
}

fn identity(source: &Arc<dyn PropertySource>) -> usize {
	Arc::as_ptr(source) as *const () as usize
}

fn connect(
	source: &Arc<dyn PropertySource>,
	property: &str,
	key: BindingKey,
	registry: Weak<Registry>,
) -> Arc<BindingInner> {
	let signal = Signal::new(source.property(property));

	Arc::new_cyclic(|me: &Weak<BindingInner>| {
		let handler = {
			let signal = signal.clone();
			source.connect_notify(property, Box::new(move |value| signal.set(value)))
		};

		let dispose_handler = {
			let me = me.clone();
			source.connect_dispose(Box::new(move || {
				if let Some(inner) = me.upgrade() {
					// The object is gone; there is nothing left to disconnect from.
					inner.connected.store(false, Ordering::SeqCst);
				}
				if let Some(registry) = registry.upgrade() {
					registry.entries.lock().remove(&key);
					let released: Vec<Arc<BindingInner>> = {
						let mut retained = registry.retained.lock();
						let (gone, kept): (Vec<_>, Vec<_>) = retained
							.drain(..)
							.partition(|kept| std::ptr::eq(Arc::as_ptr(kept), me.as_ptr()));
						*retained = kept;
						gone
					};
					drop(released);
				}
			}))
		};

		BindingInner {
			signal,
			source: Arc::downgrade(source),
			property: property.to_string(),
			handler,
			dispose_handler,
			connected: AtomicBool::new(true),
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[derive(Default)]
	struct Lamp {
		handlers: Mutex<Vec<(HandlerId, String, Arc<NotifyHandler>)>>,
		next: Mutex<HandlerId>,
	}

	impl PropertySource for Lamp {
		fn property(&self, name: &str) -> Value {
			match name {
				"on" => json!(false),
				_ => Value::Null,
			}
		}

		fn connect_notify(&self, name: &str, handler: NotifyHandler) -> HandlerId {
			let mut next = self.next.lock();
			*next += 1;
			self.handlers.lock().push((*next, name.to_string(), Arc::new(handler)));
			*next
		}

		fn disconnect(&self, handler: HandlerId) {
			self.handlers.lock().retain(|(id, _, _)| *id != handler);
		}
	}

	#[test]
	fn missing_property_reads_null() {
		let lamp = Arc::new(Lamp::default());
		let bindings = Bindings::new();
		let binding = bindings.bind(&lamp, "brightness");
		assert_eq!(*binding.get(), Value::Null);
		assert_eq!(binding.property(), "brightness");
	}

	#[test]
	fn dropping_last_handle_disconnects_native_handler() {
		let lamp = Arc::new(Lamp::default());
		let bindings = Bindings::new();
		let binding = bindings.bind(&lamp, "on");
		assert_eq!(lamp.handlers.lock().len(), 1);
		drop(binding);
		assert!(lamp.handlers.lock().is_empty());
		assert!(bindings.is_empty());
	}
}
