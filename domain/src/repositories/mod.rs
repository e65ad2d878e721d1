mod discount_code;

pub use discount_code::*;
