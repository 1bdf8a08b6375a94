pub mod common;
pub mod product;
pub mod property;

pub use common::*;
pub use product::*;
pub use property::*;
