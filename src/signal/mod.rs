/* src/signal/mod.rs */

//! Fine-grained reactive values.
//!
//! [`Signal`] is a writable cell, [`Derived`] a memoized computation over other
//! signals, and [`Binding`] mirrors a property of a host object that announces
//! its own changes. Subscribers run synchronously on the writing thread.

use std::any::Any;
use std::sync::Arc;

use parking_lot::RwLock;

mod binding;
mod cell;
mod derived;
mod node;
mod subscription;
mod tracking;

pub use binding::{
	Binding, Bindings, DisposeHandler, HandlerId, NotifyHandler, PropertySource,
};
pub use cell::{ReadSignal, Signal};
pub use derived::{DeriveMode, Derived};
pub use subscription::Subscription;
pub use tracking::{batch, in_batch, untracked};

/// Failures raised while propagating a change. None of them abort the write
/// that caused them; they go to the process-level hook instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
	#[error("subscriber {subscriber} of node {node} panicked: {message}")]
	SubscriberPanicked {
		node: u64,
		subscriber: u64,
		message: String,
	},

	#[error("refreshing derived node {node} panicked: {message}")]
	RefreshPanicked { node: u64, message: String },
}

/// Anything that can be read and subscribed to like a signal.
pub trait Readable<T> {
	/// Current value, tracked inside derivations.
	fn get(&self) -> Arc<T>;

	fn get_untracked(&self) -> Arc<T>;

	fn subscribe<F>(&self, f: F) -> Subscription
	where
		F: Fn(&T) + Send + Sync + 'static;
}

type ErrorHook = Arc<dyn Fn(&SignalError) + Send + Sync>;

static ERROR_HOOK: RwLock<Option<ErrorHook>> = parking_lot::const_rwlock(None);

/// Installs the process-wide handler for [`SignalError`]s, replacing any
/// previous one. Errors are always logged through `tracing` as well.
pub fn set_error_hook(hook: impl Fn(&SignalError) + Send + Sync + 'static) {
	*ERROR_HOOK.write() = Some(Arc::new(hook));
}

pub fn clear_error_hook() {
	*ERROR_HOOK.write() = None;
}

pub(crate) fn report(error: SignalError) {
	tracing::error!(%error, "signal propagation failed");
	let hook = ERROR_HOOK.read().clone();
	if let Some(hook) = hook {
		hook(&error);
	}
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&str>() {
		(*message).to_string()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"non-string panic payload".to_string()
	}
}
