/* src/effects/notify.rs */

/// Surfaces messages to the user.
pub trait Notifier: Send + Sync {
	fn notify(&self, summary: &str, body: &str);
}

/// Writes notifications to the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
	fn notify(&self, summary: &str, body: &str) {
		tracing::warn!(summary, body, "notification");
	}
}

impl<F> Notifier for F
where
	F: Fn(&str, &str) + Send + Sync,
{
	fn notify(&self, summary: &str, body: &str) {
		self(summary, body)
	}
}

/// Sends desktop notifications through an external program, `notify-send`
/// by default. The program runs in the background; failing to start it is
/// logged and otherwise ignored.
#[cfg(feature = "process")]
#[derive(Debug, Clone)]
pub struct CommandNotifier {
	program: String,
	handle: tokio::runtime::Handle,
}

#[cfg(feature = "process")]
impl CommandNotifier {
	pub fn new() -> Result<Self, crate::scheduler::SchedulerError> {
		Ok(Self::with_program("notify-send", tokio::runtime::Handle::try_current()?))
	}

	pub fn with_program(program: impl Into<String>, handle: tokio::runtime::Handle) -> Self {
		Self {
			program: program.into(),
			handle,
		}
	}
}

#[cfg(feature = "process")]
impl Notifier for CommandNotifier {
	fn notify(&self, summary: &str, body: &str) {
		tracing::info!(summary, body, "notification sent");
		let mut command = tokio::process::Command::new(&self.program);
		command.arg(summary).arg(body);
		let program = self.program.clone();
		self.handle.spawn(async move {
			match command.status().await {
				Ok(status) if status.success() => {}
				Ok(status) => tracing::warn!(program, %status, "notifier exited unsuccessfully"),
				Err(error) => tracing::warn!(program, %error, "failed to run notifier"),
			}
		});
	}
}
