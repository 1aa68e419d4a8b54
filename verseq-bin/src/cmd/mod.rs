use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Notify;

pub(crate) use bench::CommandBench;
pub(crate) use next::CommandNext;

mod bench;
mod next;

#[async_trait::async_trait]
pub(crate) trait Executable: 'static + Send + Sync {
    async fn execute(&self, shutdown: Arc<Notify>) -> Result<()>;
}

/// Executes `c` until it finishes, asking it to shut down once `stop` resolves first.
///
/// The error of the command, or its panic, is returned so that the process exits non-zero.
pub(crate) async fn run<F>(c: Box<dyn Executable>, stop: F) -> Result<()>
where
    F: Future,
{
    let shutdown = Arc::new(Notify::new());

    let mut handle = {
        let shutdown = Clone::clone(&shutdown);
        tokio::spawn(async move { c.execute(shutdown).await })
    };

    let finished = tokio::select! {
        res = &mut handle => Some(res),
        _ = stop => None,
    };

    let res = match finished {
        Some(res) => res,
        None => {
            info!("received stop signal, wait for graceful shutdown...");
            shutdown.notify_waiters();
            handle.await
        }
    };

    res?
}
