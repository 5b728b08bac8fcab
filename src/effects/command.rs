/* src/effects/command.rs */

use async_trait::async_trait;

use super::EffectError;

/// Runs external programs on behalf of effects.
#[async_trait]
pub trait CommandRunner: Send + Sync {
	/// Runs `program` with `args` to completion and returns its standard output.
	async fn run(&self, program: &str, args: &[String]) -> Result<String, EffectError>;
}

/// Spawns real processes with `tokio::process`.
#[cfg(feature = "process")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[cfg(feature = "process")]
#[async_trait]
impl CommandRunner for ProcessRunner {
	async fn run(&self, program: &str, args: &[String]) -> Result<String, EffectError> {
		tracing::debug!(program, ?args, "running command");
		let output = tokio::process::Command::new(program)
			.args(args)
			.output()
			.await
			.map_err(|e| EffectError::Spawn {
				program: program.to_string(),
				reason: e.to_string(),
			})?;

		if !output.status.success() {
			return Err(EffectError::Command {
				program: program.to_string(),
				status: output.status.to_string(),
				stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
			});
		}
		Ok(String::from_utf8_lossy(&output.stdout).into_owned())
	}
}

#[cfg(all(test, feature = "process", unix))]
mod tests {
	use super::*;

	#[tokio::test]
	async fn captures_stdout() {
		let out = ProcessRunner.run("echo", &["hi".to_string()]).await.unwrap();
		assert_eq!(out.trim(), "hi");
	}

	#[tokio::test]
	async fn nonzero_exit_is_a_command_error() {
		let err = ProcessRunner.run("false", &[]).await.unwrap_err();
		assert!(matches!(err, EffectError::Command { .. }));
	}

	#[tokio::test]
	async fn missing_program_is_a_spawn_error() {
		let err = ProcessRunner
			.run("definitely-not-a-real-program-xyz", &[])
			.await
			.unwrap_err();
		assert!(matches!(err, EffectError::Spawn { .. }));
	}
}
