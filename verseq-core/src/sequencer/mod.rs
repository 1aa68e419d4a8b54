use std::sync::Arc;

use once_cell::sync::Lazy;

use verseq_etc::SequencerConfig;

pub use sequencer::{Flight, Initializing, Next, Sequencer};

use crate::store::Store;
use crate::Result;

mod cache;
mod sequencer;

/// The sequencer shared by the whole process.
pub static DEFAULT_SEQUENCER: Lazy<Sequencer> = Lazy::new(Sequencer::new);

/// Initializes the process-wide sequencer, see [`Sequencer::initialize`].
pub fn initialize(store: Arc<dyn Store>, config: SequencerConfig) -> Result<Initializing> {
    DEFAULT_SEQUENCER.initialize(store, config)
}

/// Acquires an identifier from the process-wide sequencer, see [`Sequencer::get`].
pub fn get(name: &str) -> Result<Next> {
    DEFAULT_SEQUENCER.get(name)
}

pub async fn next(name: &str) -> Result<u64> {
    DEFAULT_SEQUENCER.next(name).await
}

pub fn cache_depth(name: &str) -> usize {
    DEFAULT_SEQUENCER.cache_depth(name)
}
