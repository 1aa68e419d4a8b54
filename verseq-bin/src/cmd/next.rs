use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Notify;

use crate::bootstrap::Bootstrap;

pub(crate) struct CommandNext {
    path: Option<PathBuf>,
    names: Vec<String>,
    count: usize,
}

impl CommandNext {
    pub(crate) fn new(path: Option<PathBuf>, names: Vec<String>, count: usize) -> Self {
        Self { path, names, count }
    }
}

#[async_trait]
impl super::Executable for CommandNext {
    async fn execute(&self, shutdown: Arc<Notify>) -> Result<()> {
        let bt = Bootstrap::load(self.path.as_deref()).await?;
        let seq = bt.start().await?;

        for name in &self.names {
            for _ in 0..self.count {
                let id = tokio::select! {
                    _ = shutdown.notified() => {
                        info!("command 'next' is interrupted");
                        return Ok(());
                    }
                    id = seq.next(name) => id?,
                };
                println!("{}\t{}", name, id);
            }
        }

        Ok(())
    }
}
