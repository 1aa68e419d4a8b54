use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use verseq_etc::SequencerConfig;

use crate::store::{self, Store};
use crate::{Result, VerseqError};

use super::cache::SequenceCache;

/// An operation in flight which any number of callers may await.
pub type Flight = Shared<BoxFuture<'static, Result<()>>>;

/// The outcome of an initialization started by [`Sequencer::initialize`].
pub type Initializing = Flight;

/// An identifier which is being acquired.
pub type Next = BoxFuture<'static, Result<u64>>;

#[derive(Default)]
struct State {
    store: Option<Arc<dyn Store>>,
    config: SequencerConfig,
    cache: SequenceCache,
    init_error: Option<VerseqError>,
    initializing: Option<Flight>,
    refilling: Option<Flight>,
}

enum Wait {
    Initialize(Flight),
    Refill(Flight),
}

#[derive(Copy, Clone)]
enum FlightKind {
    Initialize,
    Refill,
}

/// Frees the slot of a flight once its task is over, even if the task panics.
struct Settle {
    state: Arc<Mutex<State>>,
    kind: FlightKind,
    outcome: Option<Result<()>>,
}

impl Settle {
    fn new(state: Arc<Mutex<State>>, kind: FlightKind) -> Self {
        Self {
            state,
            kind,
            outcome: None,
        }
    }

    fn finish(mut self, res: Result<()>) -> Result<()> {
        self.outcome.replace(Clone::clone(&res));
        res
    }
}

impl Drop for Settle {
    fn drop(&mut self) {
        let outcome = self
            .outcome
            .take()
            .unwrap_or_else(|| Err(VerseqError::TaskAborted("task panicked".into())));

        let mut st = self.state.lock();
        match self.kind {
            FlightKind::Initialize => {
                st.initializing.take();
                if let Err(e) = outcome {
                    st.init_error.replace(e);
                }
            }
            FlightKind::Refill => {
                st.refilling.take();
            }
        }
    }
}

/// Issues strictly increasing identifiers per sequence name.
///
/// Identifiers are the versions of one document per name in a [`Store`]. They are
/// reserved `batch_size` at a time and cached in memory, so an identifier costs one
/// round trip per batch. At most one initialization and at most one refill are in
/// flight at any time; a refill is scoped to the name which triggered it, and
/// requests for other names wait for it before refilling on their own.
///
/// Cloning is cheap, all clones share the same state.
#[derive(Clone, Default)]
pub struct Sequencer {
    inner: Arc<Mutex<State>>,
}

impl Sequencer {
    pub fn new() -> Self {
        Default::default()
    }

    /// Adopts `store` and `config`, then makes sure the backing resource exists.
    ///
    /// Conflicting calls are rejected before anything is changed. Once accepted, the
    /// cache of every sequence is dropped right away, and the returned future reports
    /// whether the resource is ready. A failure is kept, and every later [`get`] fails
    /// with it until a new initialization succeeds.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    ///
    /// [`get`]: Sequencer::get
    pub fn initialize(
        &self,
        store: Arc<dyn Store>,
        config: SequencerConfig,
    ) -> Result<Initializing> {
        let mut st = self.inner.lock();

        if st.initializing.is_some() {
            return Err(VerseqError::AlreadyInitializing);
        }
        if st.refilling.is_some() {
            return Err(VerseqError::InitializeDuringRefill);
        }

        info!(
            "initialize sequencer: resource={}, kind={}, batch_size={}",
            &config.resource_name,
            &config.sub_resource_kind,
            config.effective_batch_size()
        );

        st.cache.clear();
        st.store.replace(Clone::clone(&store));
        st.config = Clone::clone(&config);
        st.init_error.take();

        let state = Clone::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let settle = Settle::new(state, FlightKind::Initialize);
            let res = ensure_resource(store.as_ref(), &config).await;
            if let Err(e) = &res {
                error!(
                    "failed to initialize resource '{}': {}",
                    &config.resource_name, e
                );
            }
            settle.finish(res)
        });

        let flight = into_flight(handle);
        st.initializing.replace(Clone::clone(&flight));

        Ok(flight)
    }

    /// Acquires the next identifier of sequence `name`.
    ///
    /// Misuse is reported right away: an empty name, a sequencer which was never
    /// initialized, or one whose last initialization failed. Everything else, such as
    /// store failures, comes out of the returned future.
    pub fn get(&self, name: &str) -> Result<Next> {
        if name.is_empty() {
            return Err(VerseqError::InvalidSequenceName);
        }

        {
            let st = self.inner.lock();
            if st.store.is_none() {
                return Err(VerseqError::Uninitialized);
            }
            if let Some(e) = &st.init_error {
                return Err(Clone::clone(e));
            }
        }

        let this = Clone::clone(self);
        let name = name.to_string();
        Ok(async move { this.acquire(&name).await }.boxed())
    }

    /// Same as [`get`](Sequencer::get), but awaits the identifier.
    pub async fn next(&self, name: &str) -> Result<u64> {
        self.get(name)?.await
    }

    /// Number of identifiers cached for `name`.
    pub fn cache_depth(&self, name: &str) -> usize {
        self.inner.lock().cache.depth(name)
    }

    async fn acquire(&self, name: &str) -> Result<u64> {
        loop {
            let wait = {
                let mut guard = self.inner.lock();
                let st = &mut *guard;

                if let Some(e) = &st.init_error {
                    return Err(Clone::clone(e));
                }

                if let Some(init) = &st.initializing {
                    Wait::Initialize(Clone::clone(init))
                } else if let Some(id) = st.cache.try_take(name) {
                    return Ok(id);
                } else if let Some(refill) = &st.refilling {
                    Wait::Refill(Clone::clone(refill))
                } else {
                    Wait::Refill(self.start_refill(st, name)?)
                }
            };

            match wait {
                // the outcome is kept in the state, check it again in the next round
                Wait::Initialize(flight) => {
                    let _ = flight.await;
                }
                Wait::Refill(flight) => flight.await?,
            }
        }
    }

    fn start_refill(&self, st: &mut State, name: &str) -> Result<Flight> {
        let store = st.store.clone().ok_or(VerseqError::Uninitialized)?;
        let resource = Clone::clone(&st.config.resource_name);
        let kind = Clone::clone(&st.config.sub_resource_kind);
        let batch_size = st.config.effective_batch_size().get();

        debug!(
            "refill sequence '{}' with {} identifiers from {}/{}",
            name, batch_size, &resource, &kind
        );

        let state = Clone::clone(&self.inner);
        let name = name.to_string();
        let handle = tokio::spawn(async move {
            let settle = Settle::new(Clone::clone(&state), FlightKind::Refill);

            let res = match store.bulk_version(&resource, &kind, &name, batch_size).await {
                Ok(versions) => {
                    let mut st = state.lock();
                    st.cache.append(&name, versions)
                }
                Err(e) => Err(VerseqError::from(e)),
            };

            if let Err(e) = &res {
                error!("failed to refill sequence '{}': {}", &name, e);
            }

            settle.finish(res)
        });

        let flight = into_flight(handle);
        st.refilling.replace(Clone::clone(&flight));

        Ok(flight)
    }
}

#[inline]
fn into_flight(handle: JoinHandle<Result<()>>) -> Flight {
    async move {
        match handle.await {
            Ok(res) => res,
            Err(e) => Err(VerseqError::TaskAborted(e.to_string().into())),
        }
    }
    .boxed()
    .shared()
}

async fn ensure_resource(store: &dyn Store, c: &SequencerConfig) -> Result<()> {
    let resource = c.resource_name.as_str();
    let kind = c.sub_resource_kind.as_str();

    if store.resource_exists(resource).await? {
        debug!("resource '{}' exists, put mapping of '{}'", resource, kind);
        store
            .update_schema(resource, kind, &store::schema_update(kind))
            .await?;
    } else {
        info!("create resource '{}' with mapping of '{}'", resource, kind);
        store
            .create_resource(resource, &store::resource_config(kind))
            .await?;
    }

    Ok(())
}
