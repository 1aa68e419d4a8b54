use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use hashbrown::{HashMap, HashSet};
use tokio::sync::Notify;
use tokio::task::JoinSet;

use verseq_core::Sequencer;

use crate::bootstrap::Bootstrap;

pub(crate) struct CommandBench {
    path: Option<PathBuf>,
    names: Vec<String>,
    tasks: usize,
    total: u64,
}

impl CommandBench {
    pub(crate) fn new(path: Option<PathBuf>, names: Vec<String>, tasks: usize, total: u64) -> Self {
        Self {
            path,
            names,
            tasks: usize::max(1, tasks),
            total,
        }
    }
}

/// Draws identifiers until `remaining` runs out, checking that every sequence increases.
async fn draw(
    seq: Sequencer,
    names: Arc<Vec<String>>,
    remaining: Arc<AtomicU64>,
    stopped: Arc<AtomicBool>,
    offset: usize,
) -> Result<Vec<(usize, u64)>> {
    let mut got = vec![];
    let mut last: HashMap<usize, u64> = Default::default();
    let mut i = offset;

    while !stopped.load(Ordering::SeqCst) {
        if remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_err()
        {
            break;
        }

        let idx = i % names.len();
        i += 1;

        let id = seq.next(&names[idx]).await?;
        if let Some(prev) = last.insert(idx, id) {
            if id <= prev {
                bail!(
                    "sequence '{}' goes backwards: {} after {}",
                    &names[idx],
                    id,
                    prev
                );
            }
        }
        got.push((idx, id));
    }

    Ok(got)
}

#[async_trait]
impl super::Executable for CommandBench {
    async fn execute(&self, shutdown: Arc<Notify>) -> Result<()> {
        let bt = Bootstrap::load(self.path.as_deref()).await?;
        let seq = bt.start().await?;

        let names = Arc::new(Clone::clone(&self.names));
        let remaining = Arc::new(AtomicU64::new(self.total));
        let stopped = Arc::new(AtomicBool::new(false));

        {
            let stopped = Clone::clone(&stopped);
            tokio::spawn(async move {
                shutdown.notified().await;
                stopped.store(true, Ordering::SeqCst);
            });
        }

        let start = Instant::now();

        let mut joins = JoinSet::new();
        for offset in 0..self.tasks {
            joins.spawn(draw(
                Clone::clone(&seq),
                Clone::clone(&names),
                Clone::clone(&remaining),
                Clone::clone(&stopped),
                offset,
            ));
        }

        let mut seen: HashSet<(usize, u64)> = Default::default();
        let mut cnt = 0u64;
        while let Some(res) = joins.join_next().await {
            for next in res?? {
                if !seen.insert(next) {
                    bail!(
                        "identifier {} of sequence '{}' is handed out twice",
                        next.1,
                        &names[next.0]
                    );
                }
                cnt += 1;
            }
        }

        let elapsed = start.elapsed();
        let rate = cnt as f64 / f64::max(elapsed.as_secs_f64(), f64::EPSILON);

        info!(
            "bench finish: ids={}, tasks={}, names={}, elapsed={:?}, rate={:.0}/s",
            cnt,
            self.tasks,
            names.len(),
            elapsed,
            rate
        );
        for name in names.iter() {
            println!("{}\tcached={}", name, seq.cache_depth(name));
        }

        Ok(())
    }
}
