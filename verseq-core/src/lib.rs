#![allow(clippy::type_complexity)]
#![allow(clippy::from_over_into)]
#![allow(clippy::module_inception)]
#![allow(clippy::upper_case_acronyms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

pub use builtin::setup;
pub use error::VerseqError;
pub use sequencer::{
    cache_depth, get, initialize, next, Flight, Initializing, Next, Sequencer, DEFAULT_SEQUENCER,
};
pub use store::{MemoryStore, Store};

pub type Result<T> = std::result::Result<T, VerseqError>;

mod builtin;
mod error;
mod sequencer;
pub mod store;
