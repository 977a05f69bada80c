//! Drying-curve models.
//!
//! A model is picked by its command-line number ([`ModelTag`]), resolved to a
//! [`ModelKind`], and turned into an evaluable [`DecayModel`] once the first
//! measured mass is known.

mod decay;

pub use decay::{DecayModel, DerivedMasses, ModelKind, ModelTag};
