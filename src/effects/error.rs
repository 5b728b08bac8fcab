/* src/effects/error.rs */

/// Why a side effect failed. Effects never take down the store; failures are
/// logged, broadcast and handed to the notifier.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EffectError {
	/// An external command exited unsuccessfully.
	#[error("`{program}` exited with {status}: {stderr}")]
	Command {
		program: String,
		status: String,
		stderr: String,
	},

	/// An external command could not be started.
	#[error("failed to spawn `{program}`: {reason}")]
	Spawn { program: String, reason: String },

	#[error("io error: {0}")]
	Io(String),

	/// The effect panicked while running.
	#[error("effect panicked: {0}")]
	Panicked(String),

	#[error("{0}")]
	Custom(String),
}

impl From<std::io::Error> for EffectError {
	fn from(e: std::io::Error) -> Self {
		EffectError::Io(e.to_string())
	}
}

impl From<crate::persist::PersistError> for EffectError {
	fn from(e: crate::persist::PersistError) -> Self {
		EffectError::Custom(e.to_string())
	}
}
