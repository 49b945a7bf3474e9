//! Combinator Factory
//!
//! Generic machinery for building chainable, state-threading APIs. A [`Unit`]
//! wraps values into [`Wrapper`]s and owns a registry of named operations
//! that every wrapper it produced can call. Knows nothing about audio.

mod unit;

pub use unit::{Bound, Lifted, Mode, Reply, Unit, Wrapper};
