//! Convenience wrappers for assembling and running programs

use std::path::Path;

use log::debug;

use crate::asm::assemble;
use crate::computer::Computer;
use crate::error::SimulatorResult;
use crate::tracker::CostTracker;

/// Assembles a source string and returns a machine with the program
/// loaded at address 0
pub fn prepare(source: &str) -> SimulatorResult<Computer> {
    let program = assemble(source)?;
    debug!("assembled {} instruction words", program.len());
    let mut computer = Computer::make();
    computer.load_program(&program);
    Ok(computer)
}

/// Runs a prepared machine with a cost tracker attached.
/// The returned tracker holds the metrics for the whole run.
pub fn run(
    computer: &mut Computer,
    limit: Option<u64>,
) -> SimulatorResult<CostTracker> {
    let tracker = computer.attach_tracker();
    match limit {
        Some(limit) => computer.run_with_limit(limit)?,
        None => computer.run()?,
    }
    Ok(tracker)
}

/// Assembles and runs an assembly file
pub fn run_file(
    path: impl AsRef<Path>,
    limit: Option<u64>,
) -> SimulatorResult<(Computer, CostTracker)> {
    let source = std::fs::read_to_string(path)?;
    let mut computer = prepare(&source)?;
    let tracker = run(&mut computer, limit)?;
    Ok((computer, tracker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_and_run() {
        let mut computer = prepare("LOAD 50 2\nSTORE 2 51\nHALT\n").unwrap();
        computer.poke(50, 123);
        let tracker = run(&mut computer, Some(10)).unwrap();
        assert_eq!(computer.peek(51), 123);
        assert_eq!(tracker.instructions_executed(), 3);
    }

    #[test]
    fn test_limit_is_enforced() {
        let mut computer = prepare("NOP\nJUMP 0 1 DEC\n").unwrap();
        assert!(run(&mut computer, Some(50)).is_err());
    }
}
