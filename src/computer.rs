//! The CPU: fetch-decode-execute over the register file and memory

use std::cell::RefCell;
use std::rc::Rc;

use log::trace;

use crate::alu::{alu, AluOp};
use crate::error::{SimulatorError, SimulatorResult};
use crate::instruction::{decode, Op};
use crate::memory::Memory;
use crate::printer::{Printer, StdoutPrinter};
use crate::registers::RegisterFile;
use crate::tracker::CostTracker;

/// A complete machine: register file, unified memory and printer hook.
///
/// Strictly single-threaded and synchronous; one instruction completes
/// fully before the next begins.
pub struct Computer {
    regs: RegisterFile,
    memory: Memory,
    printer: Rc<RefCell<dyn Printer>>,
    running: bool,
}

impl Computer {
    pub fn make() -> Self {
        Self {
            regs: RegisterFile::make(),
            memory: Memory::make(),
            printer: Rc::new(RefCell::new(StdoutPrinter)),
            running: true,
        }
    }

    /// Replaces the PRINT hook
    pub fn set_printer(&mut self, printer: Rc<RefCell<dyn Printer>>) {
        self.printer = printer;
    }

    /// Loads a program image at address 0, behind the cost model
    pub fn load_program(&mut self, image: &[u32]) {
        self.memory.load_image(image);
    }

    /// Host-side single-cell write, useful for program arguments
    pub fn poke(&mut self, addr: u16, value: u32) {
        self.memory.poke(addr, value);
    }

    /// Host-side single-cell read, useful for program outputs
    pub fn peek(&self, addr: u16) -> u32 {
        self.memory.peek(addr)
    }

    pub fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn regs_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Attaches a scoped cost observer to this machine's event bus
    pub fn attach_tracker(&mut self) -> CostTracker {
        CostTracker::attach(self.memory.bus_mut())
    }

    /// Restores the reset state: registers and status bits zeroed, PC = 0,
    /// cache invalid with zeroed PLRU. RAM is kept as loaded.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.memory.reset_cache();
        self.running = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Runs until HALT
    pub fn run(&mut self) -> SimulatorResult<()> {
        self.running = true;
        while self.step()? {}
        Ok(())
    }

    /// Runs until HALT, failing if `limit` instructions complete first
    pub fn run_with_limit(&mut self, limit: u64) -> SimulatorResult<()> {
        self.running = true;
        let mut executed = 0;
        while self.step()? {
            executed += 1;
            if executed >= limit {
                return Err(SimulatorError::ExecutionLimitReached(limit));
            }
        }
        Ok(())
    }

    /// Executes one instruction and returns whether the machine still runs.
    ///
    /// PC advances by 1 (mod 2^16) for every instruction; a satisfied JMP
    /// overrides with PC ± data instead.
    pub fn step(&mut self) -> SimulatorResult<bool> {
        let pc = self.regs.pc();
        let word = self.memory.fetch(pc);
        let op = decode(word, pc)?;
        trace!("PC={pc:#06x} {op:?}");

        let mut next_pc = pc.wrapping_add(1);
        match op {
            Op::Nop => {}
            Op::Halt => self.running = false,
            Op::Add { a, b, d } => self.alu_op(AluOp::Add, a, b, d),
            Op::Sub { a, b, d } => self.alu_op(AluOp::Sub, a, b, d),
            Op::LShift { a, b, d } => self.alu_op(AluOp::LShift, a, b, d),
            Op::RShift { a, b, d } => self.alu_op(AluOp::RShift, a, b, d),
            Op::Comp { a, b, s } => {
                let result = self.regs.read(a) == self.regs.read(b);
                self.regs.set_status(s, result);
            }
            Op::CompGrt { a, b, s } => {
                // Unsigned comparison
                let result = self.regs.read(a) > self.regs.read(b);
                self.regs.set_status(s, result);
            }
            Op::CompLst { a, b, s } => {
                let result = self.regs.read(a) < self.regs.read(b);
                self.regs.set_status(s, result);
            }
            Op::Load { reg, flags, addr } => {
                // Immediate mode sources the already-fetched word;
                // it makes no further memory access
                let source =
                    if flags.immediate { word } else { self.memory.load(addr) };
                let (value, keep_mask) = flags.transfer(source);
                let merged = (self.regs.read(reg) & keep_mask) | value;
                self.regs.write(reg, merged);
            }
            Op::Store { reg, flags, addr } => {
                let source =
                    if flags.immediate { word } else { self.regs.read(reg) };
                let (value, keep_mask) = flags.transfer(source);
                self.memory.store_masked(addr, value, keep_mask);
            }
            Op::Jump { status, flags, offset } => {
                if self.regs.status(status) == flags.on_high {
                    next_pc = if flags.subtract {
                        pc.wrapping_sub(offset)
                    } else {
                        pc.wrapping_add(offset)
                    };
                }
            }
            Op::Print { a, b, addr } => {
                let reg_a = self.regs.read(a);
                let reg_b = self.regs.read(b);
                let mem_word = self.memory.load(addr);
                self.printer.borrow_mut().print(reg_a, reg_b, mem_word);
            }
        }

        self.regs.set_pc(next_pc);
        Ok(self.running)
    }

    fn alu_op(&mut self, op: AluOp, a: u8, b: u8, d: u8) {
        let value = alu(op, self.regs.read(a), self.regs.read(b));
        self.regs.write(d, value);
    }
}

impl Default for Computer {
    fn default() -> Self {
        Self::make()
    }
}
