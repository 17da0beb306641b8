pub mod fixer;
pub mod instruction;

pub use fixer::*;
pub use instruction::*;
