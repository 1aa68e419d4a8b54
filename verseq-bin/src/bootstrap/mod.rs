pub(crate) use runtime::Bootstrap;

mod runtime;
