mod arena;
mod handle;

pub use arena::{Chain, LeafArena};
pub use handle::LeafId;
