//! Domain models for medicine matching.

mod matching;
mod product;

pub use matching::*;
pub use product::*;
