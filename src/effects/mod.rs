/* src/effects/mod.rs */

//! Collaborators effects run against: user notifications, external
//! commands, the compositor config writer and stylesheet regeneration.

mod command;
mod error;
pub mod hypr;
mod notify;
pub mod style;

pub use command::CommandRunner;
pub use error::EffectError;
pub use hypr::{HyprSetting, HyprSync};
pub use notify::{LogNotifier, Notifier};
pub use style::{STYLE_KEY, StyleVariables};

#[cfg(feature = "process")]
pub use command::ProcessRunner;
#[cfg(feature = "process")]
pub use notify::CommandNotifier;
