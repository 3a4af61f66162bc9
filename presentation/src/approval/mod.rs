//! Terminal plan approval

pub mod console;
pub mod piped;
