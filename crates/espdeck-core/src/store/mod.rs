// ── Reactive data store ──

mod collection;
mod data_store;
mod sequence;

pub use data_store::{DataStore, RefreshKind};
pub(crate) use sequence::Sequencer;
