//! PRINT side channel

/// Output hook for the PRINT opcode.
///
/// The hook observes register and memory snapshots; it must not reach back
/// into the CPU. Hosts wanting numbered debug handlers dispatch on the
/// values they receive here.
pub trait Printer {
    fn print(&mut self, reg_a: u32, reg_b: u32, mem_word: u32);
}

/// Default hook: writes one line per PRINT to stdout
#[derive(Default)]
pub struct StdoutPrinter;

impl Printer for StdoutPrinter {
    fn print(&mut self, reg_a: u32, reg_b: u32, mem_word: u32) {
        println!(
            "print: register a: {reg_a:032b} = {reg_a}, \
             register b: {reg_b:032b} = {reg_b}, \
             memory: {mem_word:032b} = {mem_word}"
        );
    }
}

/// Collects PRINT output for inspection in tests
#[derive(Default)]
pub struct CapturePrinter {
    pub lines: Vec<(u32, u32, u32)>,
}

impl Printer for CapturePrinter {
    fn print(&mut self, reg_a: u32, reg_b: u32, mem_word: u32) {
        self.lines.push((reg_a, reg_b, mem_word));
    }
}
