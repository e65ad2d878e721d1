mod discount_code;
mod field;
mod outcome;
pub mod primitives;

pub use discount_code::*;
pub use field::*;
pub use outcome::*;
