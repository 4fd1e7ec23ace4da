//! Row and column types

mod column;
mod row;

pub use column::*;
pub use row::*;
