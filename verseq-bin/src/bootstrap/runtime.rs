use std::path::{Path, PathBuf};

use verseq_core::{store, Sequencer};
use verseq_etc::{BootstrapConf, LoggerConfig};

pub(crate) struct Bootstrap {
    bc: BootstrapConf,
}

impl Bootstrap {
    /// Reads the bootstrap configuration, or uses the defaults if no path is given.
    pub(crate) async fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let bc = match path {
            None => BootstrapConf::default(),
            Some(path) => {
                let pb = match path.to_str().and_then(|it| it.strip_prefix("~/")) {
                    Some(rel) => dirs::home_dir().unwrap_or_default().join(rel),
                    None => PathBuf::from(path),
                };
                let b = tokio::fs::read(&pb).await?;
                BootstrapConf::from_yaml(&b[..])?
            }
        };
        Ok(Self::from(bc))
    }

    fn init_logger(c: &LoggerConfig) {
        let mut b = pretty_env_logger::formatted_timed_builder();
        match std::env::var("RUST_LOG") {
            Ok(filters) => b.parse_filters(&filters),
            Err(_) => b.parse_filters(&c.level),
        };
        b.try_init().ok();
    }

    /// Builds the configured store and initializes a sequencer against it.
    pub(crate) async fn start(&self) -> anyhow::Result<Sequencer> {
        Self::init_logger(&self.bc.logger);

        verseq_core::setup().await;

        let store = store::load(&self.bc.store)?;
        let seq = Sequencer::new();
        seq.initialize(store, Clone::clone(&self.bc.sequencer))?
            .await?;

        info!(
            "sequencer is ready: store={}, resource={}",
            &self.bc.store.kind, &self.bc.sequencer.resource_name
        );

        Ok(seq)
    }
}

impl From<BootstrapConf> for Bootstrap {
    fn from(value: BootstrapConf) -> Self {
        Self { bc: value }
    }
}
