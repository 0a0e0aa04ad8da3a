//! Paint primitives.
//!
//! Colors are stored linear with straight alpha; conversion from sRGB
//! literals happens at construction time.

mod color;

pub use color::Color;
