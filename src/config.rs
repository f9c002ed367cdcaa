//! Settings: the serde schema and the file/environment loader.
//!
//! Every section has defaults, so a missing or partial config file is valid.

mod load;
mod schema;

pub use schema::*;

#[cfg(test)]
mod tests;
