use thiserror::Error;

/// Top-level error type for the simulator
#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("Invalid opcode {opcode:#08b} at PC={pc:#06x}")]
    BadInstruction { opcode: u8, pc: u16 },

    #[error("Execution limit reached: {0} instructions")]
    ExecutionLimitReached(u64),

    #[error("Assembly error: {0}")]
    Assembler(#[from] AsmError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors raised by the assembler, carrying the offending source line
#[derive(Error, Debug)]
pub enum AsmError {
    #[error("Unknown mnemonic '{token}' at line {line}")]
    UnknownMnemonic { line: usize, token: String },

    #[error("Unknown flag '{token}' at line {line}")]
    UnknownFlag { line: usize, token: String },

    #[error("Could not parse argument '{token}' at line {line}")]
    BadArgument { line: usize, token: String },

    #[error("Argument {value} at line {line} is out of range (max {max})")]
    ArgumentOutOfRange { line: usize, value: u64, max: u64 },

    #[error("Instruction at line {line} takes {expected} arguments, but {given} were given")]
    WrongArgumentCount { line: usize, expected: String, given: usize },

    #[error("Unknown label '{label}' at line {line}")]
    UnknownLabel { line: usize, label: String },
}

/// Type alias for Result with SimulatorError
pub type SimulatorResult<T> = Result<T, SimulatorError>;
