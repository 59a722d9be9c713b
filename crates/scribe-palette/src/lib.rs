mod catalog;
mod commit;
mod controller;
mod geom;
mod navigation;
mod resolver;
mod state;
mod trigger;

pub use crate::catalog::*;
pub use crate::commit::*;
pub use crate::controller::*;
pub use crate::geom::*;
pub use crate::navigation::*;
pub use crate::resolver::*;
pub use crate::state::*;
pub use crate::trigger::*;
