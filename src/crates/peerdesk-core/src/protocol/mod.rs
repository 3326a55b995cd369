//! Wire protocol: length-framed JSON envelopes and the input event model.

pub mod envelope;
pub mod frame;
pub mod wire;
