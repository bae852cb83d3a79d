use std::any::Any;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result, anyhow};

/// A collaborator call running on its own thread. The caller decides when
/// to block on it; nothing is pushed back into the caller.
pub struct FetchTask<T> {
    label: &'static str,
    handle: JoinHandle<Result<T>>,
}

impl<T: Send + 'static> FetchTask<T> {
    pub fn spawn<F>(label: &'static str, job: F) -> Result<Self>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(format!("fetch-{label}"))
            .spawn(job)
            .with_context(|| format!("failed to spawn {label} task"))?;
        Ok(Self { label, handle })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Block until the task ends. A panic inside the task comes back as an error.
    pub fn join(self) -> Result<T> {
        let label = self.label;
        match self.handle.join() {
            Ok(result) => result.with_context(|| format!("{label} task failed")),
            Err(payload) => Err(anyhow!(
                "{label} task panicked: {}",
                panic_message(payload.as_ref())
            )),
        }
    }
}

/// Wait for both tasks, whatever the first one returns, so neither thread
/// is left running and a successful side is never thrown away.
pub fn join_both<A, B>(first: FetchTask<A>, second: FetchTask<B>) -> (Result<A>, Result<B>)
where
    A: Send + 'static,
    B: Send + 'static,
{
    let first = first.join();
    let second = second.join();
    (first, second)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::*;

    #[test]
    fn join_returns_value() {
        let task = FetchTask::spawn("sum", || Ok(2 + 2)).expect("spawn");
        assert_eq!(task.label(), "sum");
        assert_eq!(task.join().expect("join"), 4);
    }

    #[test]
    fn errors_carry_the_label() {
        let task: FetchTask<()> =
            FetchTask::spawn("props", || Err(anyhow!("ODDS_API_KEY missing"))).expect("spawn");
        let err = task.join().unwrap_err();
        assert!(format!("{err:#}").contains("props task failed"));
        assert!(format!("{err:#}").contains("ODDS_API_KEY missing"));
    }

    #[test]
    fn panics_become_errors() {
        let task: FetchTask<()> = FetchTask::spawn("stats", || panic!("boom")).expect("spawn");
        let err = task.join().unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn early_failure_still_waits_for_the_other_side() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let stats: FetchTask<u32> =
            FetchTask::spawn("stats", || Err(anyhow!("scoreboard down"))).expect("spawn");
        let props = FetchTask::spawn("props", move || {
            thread::sleep(Duration::from_millis(50));
            flag.store(true, Ordering::SeqCst);
            Ok(vec!["player_pass_yds"])
        })
        .expect("spawn");

        let (stats, props) = join_both(stats, props);
        assert!(stats.is_err());
        assert!(finished.load(Ordering::SeqCst));
        assert_eq!(props.expect("props"), vec!["player_pass_yds"]);
    }
}
