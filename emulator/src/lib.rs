pub mod constants;
pub mod disassembler;
pub mod loader;
pub mod runtime;

pub use self::{
    disassembler::disassemble,
    loader::{parse_program, Program},
    runtime::Computer,
};
