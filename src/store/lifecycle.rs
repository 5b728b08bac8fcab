/* src/store/lifecycle.rs */

use std::sync::Arc;

use crate::persist::{Format, LoadOutcome};
use crate::reconcile::reconcile_with_report;

use super::event::{LoadKind, StoreEvent};
use super::{SettingsStore, StoreError};

/// Scheduler key of the persistence effect.
pub const PERSIST_KEY: &str = "persist";

/// Scheduler key of the live-reload effect.
pub const RELOAD_KEY: &str = "reload";

impl SettingsStore {
	/// Loads and reconciles the persisted document into the root. Returns
	/// true when the stored form has to be rewritten.
	pub(crate) async fn load_initial(&self) -> bool {
		let Some(persister) = &self.persister else {
			self.announce(LoadKind::Ephemeral, Vec::new(), Vec::new());
			return false;
		};
		let location = persister.persistence.location();

		match persister.persistence.load().await {
			LoadOutcome::Loaded(loaded) => {
				let report = reconcile_with_report(&self.schema, &loaded);
				let needs_write = report.document != loaded;
				if !report.dropped.is_empty() || !report.conflicts.is_empty() {
					tracing::info!(
						%location,
						dropped = ?report.dropped,
						conflicts = ?report.conflicts,
						"stored settings reconciled against schema"
					);
				}
				persister.remember(Arc::new(loaded));
				self.root.set(report.document);
				self.announce(LoadKind::Stored, report.dropped, report.conflicts);
				needs_write
			}
			LoadOutcome::Missing => {
				tracing::info!(%location, "no stored settings, writing defaults");
				self.announce(LoadKind::Missing, Vec::new(), Vec::new());
				true
			}
			LoadOutcome::Invalid(error) => {
				tracing::warn!(%location, %error, "stored settings unreadable, using defaults");
				self.notifier
					.notify("Settings reset", &format!("{location} could not be read: {error}"));
				self.announce(LoadKind::Invalid, Vec::new(), Vec::new());
				true
			}
		}
	}

	pub(crate) fn announce(&self, kind: LoadKind, dropped: Vec<String>, conflicts: Vec<String>) {
		self.events.emit(|| StoreEvent::Loaded {
			kind,
			dropped,
			conflicts,
		});
	}

	/// Connects the root to the persistence effect and the event channel.
	pub(crate) fn wire(&self) {
		let mut wiring = self.wiring.lock();

		if self.persister.is_some() {
			let scheduler = self.scheduler.clone();
			wiring.push(self.root.subscribe(move |_| {
				if let Err(error) = scheduler.trigger(PERSIST_KEY) {
					tracing::warn!(%error, "could not schedule settings write");
				}
			}));
		}

		let events = self.events.clone();
		wiring.push(self.root.subscribe(move |_| events.emit(|| StoreEvent::Changed)));
	}

	/// Writes the current document now, dropping any pending coalesced write.
	pub async fn flush(&self) -> Result<(), StoreError> {
		let Some(persister) = &self.persister else {
			return Ok(());
		};
		self.scheduler.cancel(PERSIST_KEY);
		persister.persist().await?;
		Ok(())
	}

	/// Flushes, disconnects every path and effect wiring, and waits for
	/// scheduled effects to finish. The store stays readable and writable
	/// but no longer persists or triggers effects.
	pub async fn shutdown(&self) -> Result<(), StoreError> {
		let wiring = std::mem::take(&mut *self.wiring.lock());
		drop(wiring);
		let flushed = self.flush().await;
		self.scheduler.idle().await;
		tracing::debug!("settings store shut down");
		flushed
	}

	/// Re-reads persistence and adopts the stored document if it differs from
	/// both the current document and what this store itself last wrote.
	///
	/// Returns whether the document changed. A missing file keeps the current
	/// document; an unreadable one is reported and also keeps it.
	pub async fn reload(&self) -> Result<bool, StoreError> {
		let Some(persister) = &self.persister else {
			return Err(StoreError::NotPersisted);
		};

		match persister.persistence.load().await {
			LoadOutcome::Loaded(loaded) => {
				if persister.matches_last(&loaded) {
					tracing::trace!("reload skipped, stored document is our own");
					return Ok(false);
				}
				let report = reconcile_with_report(&self.schema, &loaded);
				persister.remember(Arc::new(loaded));
				if *self.root.get_untracked() == report.document {
					return Ok(false);
				}
				tracing::info!(location = %persister.persistence.location(), "settings reloaded");
				self.root.set(report.document);
				self.events.emit(|| StoreEvent::Reloaded);
				Ok(true)
			}
			LoadOutcome::Missing => {
				tracing::warn!(
					location = %persister.persistence.location(),
					"stored settings disappeared, keeping current document"
				);
				Ok(false)
			}
			LoadOutcome::Invalid(error) => {
				tracing::warn!(%error, "stored settings unreadable, keeping current document");
				Err(error.into())
			}
		}
	}

	/// Renders the current document the way it is persisted, JSON when the
	/// store has no persistence.
	pub fn export(&self) -> Result<String, StoreError> {
		let format = self
			.persister
			.as_ref()
			.map(|p| p.persistence.format())
			.unwrap_or_default();
		let bytes = format.render(&self.root.get_untracked())?;
		Ok(String::from_utf8_lossy(&bytes).into_owned())
	}
}
