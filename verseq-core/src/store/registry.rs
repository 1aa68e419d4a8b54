use std::sync::Arc;

use hashbrown::HashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use verseq_etc::StoreConfig;

use crate::{Result, VerseqError};

use super::Store;

type StoreFactory = Arc<dyn Send + Sync + Fn(&StoreConfig) -> Result<Arc<dyn Store>>>;

static REGISTRY: Lazy<RwLock<HashMap<String, StoreFactory>>> = Lazy::new(Default::default);

/// Registers a factory building stores of the given kind, replacing any previous one.
pub fn register<I, T, G>(kind: I, g: G)
where
    I: Into<String>,
    T: Store,
    G: 'static + Sync + Send + Fn(&StoreConfig) -> Result<T>,
{
    let kind = kind.into();

    let wrapper = move |c: &StoreConfig| -> Result<Arc<dyn Store>> {
        let store = g(c)?;
        Ok(Arc::new(store))
    };

    let mut lock = REGISTRY.write();
    if lock.insert(Clone::clone(&kind), Arc::new(wrapper)).is_some() {
        warn!("store '{}' is registered again, the previous one is replaced", &kind);
    }
}

/// Builds a store from the registered factory of `c.kind`.
pub fn load(c: &StoreConfig) -> Result<Arc<dyn Store>> {
    let g = {
        let lock = REGISTRY.read();
        lock.get(&c.kind).cloned()
    };

    match g {
        Some(g) => g(c).map_err(|e| {
            error!("cannot build store '{}': {}", &c.kind, e);
            VerseqError::InvalidStore(format!("{}: {}", &c.kind, e).into())
        }),
        None => Err(VerseqError::InvalidStore(Clone::clone(&c.kind).into())),
    }
}
