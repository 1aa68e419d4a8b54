use std::borrow::Cow;
use std::sync::Arc;

#[derive(thiserror::Error, Debug, Clone)]
pub enum VerseqError {
    #[error("invalid store '{0}'")]
    InvalidStore(/* store kind */ Cow<'static, str>),

    #[error("initialize was called while a previous initialize is pending")]
    AlreadyInitializing,

    #[error("initialize was called while a refill is pending")]
    InitializeDuringRefill,

    #[error("invalid sequence name")]
    InvalidSequenceName,

    #[error("sequencer is not initialized, call initialize first")]
    Uninitialized,

    #[error("invalid configuration '{0}'")]
    InvalidConfig(Cow<'static, str>),

    #[error("store operation failed: {0}")]
    Store(Arc<anyhow::Error>),

    #[error("invalid versions returned for sequence '{0}': {1}")]
    InvalidVersions(/* sequence name */ String, /* reason */ Cow<'static, str>),

    #[error("background task aborted: {0}")]
    TaskAborted(Cow<'static, str>),
}

impl From<anyhow::Error> for VerseqError {
    fn from(value: anyhow::Error) -> Self {
        VerseqError::Store(Arc::new(value))
    }
}
