//! Domain data types

pub mod inventory;
pub mod reorder;
pub mod sync;
pub mod token;

pub use inventory::*;
pub use reorder::*;
pub use sync::*;
pub use token::*;
