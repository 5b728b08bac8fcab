/* src/lib.rs */

//! A reactive settings store for a desktop shell.
//!
//! This crate integrates four layers:
//!
//! - **signal**: Fine-grained reactive cells, lazily cached derivations,
//!   batching and bindings onto external observable objects.
//! - **store**: One JSON-shaped settings document addressed by dotted paths,
//!   reconciled against a schema of defaults on load.
//! - **persist**: Format-agnostic persistence backends (file, memory).
//! - **scheduler** / **effects**: Keyed, coalesced side effects such as
//!   writing the settings file, regenerating compositor config or rebuilding
//!   the stylesheet.
//!
//! ## Feature Flags
//!
//! - `full`: Enables all features.
//! - `fs`: File persistence backend (default).
//! - `toml`, `yaml`: Extra persistence formats; JSON is always available.
//! - `events`: Broadcast [`StoreEvent`]s.
//! - `stream`: Store events as a `Stream`.
//! - `process`: Run external commands and desktop notifications.
//! - `watch`: Reload the settings file when it changes on disk.
//!
//! ## Basic Usage
//!
//! See `demos/basic.rs` for a complete example.

pub mod descriptor;
pub mod effects;
pub mod persist;
pub mod reconcile;
pub mod scheduler;
pub mod schema;
pub mod signal;
pub mod store;

#[cfg(feature = "watch")]
pub mod watch;

pub use descriptor::{RangeKind, Ranged};
pub use effects::{EffectError, Notifier};
pub use persist::{AnyFormat, Backend, PersistError, Persistence};
pub use reconcile::{Reconciliation, reconcile};
pub use scheduler::{Scheduler, SchedulerError};
pub use signal::{Derived, ReadSignal, Readable, Signal, SignalError, Subscription, batch, untracked};
pub use store::{Path, Setting, SettingsStore, SettingsStoreBuilder, StoreError, StoreEvent};
