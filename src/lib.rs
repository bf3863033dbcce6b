mod bbtree;
mod depth;
mod empty;
mod error;
mod node;

pub use crate::bbtree::{Bbtree, Stats};
pub use crate::depth::Depth;
pub use crate::empty::Empty;
pub use crate::error::Error;

#[cfg(test)]
mod depth_test;
#[cfg(test)]
mod node_test;
