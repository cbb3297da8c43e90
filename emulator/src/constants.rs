pub type Address = u8;
pub type Word = u8;

/// Total size of the computer memory
pub const MEMORY_SIZE: usize = 256;

/// Number of general purpose registers
pub const REGISTER_COUNT: usize = 8;

/// Where programs are loaded, and where %pc points after a halt
pub const PROGRAM_START: Address = 0;
