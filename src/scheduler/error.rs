/* src/scheduler/error.rs */

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
	/// No tokio runtime was running where the scheduler was created.
	#[error("no tokio runtime available: {0}")]
	NoRuntime(#[from] tokio::runtime::TryCurrentError),

	/// `trigger` named a key nothing was registered under.
	#[error("no effect registered under key `{0}`")]
	UnknownKey(String),
}
