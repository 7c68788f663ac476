mod number;
mod record;
mod role;

pub use record::*;
pub use role::*;

#[cfg(test)]
pub(crate) use role::fixtures;
