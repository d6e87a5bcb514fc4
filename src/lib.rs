pub mod alu;
pub mod asm;
pub mod computer;
pub mod error;
pub mod events;
pub mod instruction;
pub mod memory;
pub mod printer;
pub mod registers;
pub mod run_wrapper;
pub mod tracker;
