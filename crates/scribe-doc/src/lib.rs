mod doc;
mod key;
mod node;

pub use crate::doc::*;
pub use crate::key::*;
pub use crate::node::*;
