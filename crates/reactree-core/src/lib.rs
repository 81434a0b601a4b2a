#![forbid(unsafe_code)]

//! Core: observable cells, the batching store, derived values, and the
//! logging shims shared by every Reactree crate.

pub mod logging;
pub mod reactive;

pub use reactive::{
    CellMap, CellMapEvent, Computed, Observable, ReadCell, Readable, Store, Subscription,
};
