/*
 * Runs request jobs away from the interaction thread. The client logic never blocks on
 * the network: it hands a job to a `TaskRunnerOperations` implementation and later
 * picks up the job's completion message from a channel. Keeping this behind a trait
 * lets tests run jobs synchronously and in any order they choose.
 */
use std::io;
use std::thread;

pub type Job = Box<dyn FnOnce() + Send + 'static>;

pub trait TaskRunnerOperations: Send + Sync {
    /*
     * Schedules `job` for execution. `label` names the job in logs and thread names.
     * The runner must eventually run every job it accepts exactly once. An `Err` means
     * the job was not accepted and has been dropped unrun.
     */
    fn spawn(&self, label: &str, job: Job) -> io::Result<()>;
}

// Runs each job on its own short-lived thread. Requests are infrequent and user-driven.
pub struct ThreadTaskRunner {}

impl ThreadTaskRunner {
    pub fn new() -> Self {
        ThreadTaskRunner {}
    }
}

impl Default for ThreadTaskRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRunnerOperations for ThreadTaskRunner {
    fn spawn(&self, label: &str, job: Job) -> io::Result<()> {
        log::trace!("ThreadTaskRunner: Spawning worker for '{label}'.");
        thread::Builder::new()
            .name(format!("request-{label}"))
            .spawn(job)
            .map(|_detached| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_thread_task_runner_runs_job() {
        // Arrange
        let runner = ThreadTaskRunner::new();
        let (tx, rx) = mpsc::channel();

        // Act
        runner
            .spawn(
                "test",
                Box::new(move || {
                    let name = thread::current().name().map(str::to_string);
                    tx.send(name).unwrap();
                }),
            )
            .unwrap();

        // Assert
        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("request-test"));
    }
}
