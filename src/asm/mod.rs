//! Assembler: text to machine-code words.
//!
//! One instruction per line, `#` starts a comment, `[NAME]` on its own line
//! defines a jump label. Jump amounts may reference a label; the encoded
//! displacement is the line distance and the program supplies the
//! direction with INC/DEC.

pub mod utils;

use std::collections::HashMap;

use crate::error::AsmError;
use crate::instruction::codec::pack;
use crate::instruction::{
    OPCODE_ADD, OPCODE_COMP, OPCODE_COMPGRT, OPCODE_COMPLST, OPCODE_HALT,
    OPCODE_JMP, OPCODE_LOAD, OPCODE_LSHIFT, OPCODE_NOP, OPCODE_PRINT,
    OPCODE_RSHIFT, OPCODE_STORE, OPCODE_SUB,
};
use self::utils::{parse_addr, parse_reg, require_args};

/// LOAD/STORE flag tokens and their arg2 bits
const COPY_FLAGS: [(&str, u8); 10] = [
    ("HALF", 0b00001),
    ("FULL", 0),
    ("FRM_SIG", 0b00010),
    ("FROM_LOW", 0),
    ("TO_SIG", 0b00100),
    ("TO_LOW", 0),
    ("OVERWRITE", 0b01000),
    ("NO_OVERWRITE", 0),
    ("IMMEDIATE", 0b10000),
    ("NORMAL", 0),
];

/// JUMP flag tokens and their arg2 bits
const JUMP_FLAGS: [(&str, u8); 4] =
    [("ON_HIGH", 0b01), ("ON_LOW", 0), ("DEC", 0b10), ("INC", 0)];

/// Assembles a program into the word image to load at address 0
pub fn assemble(source: &str) -> Result<Vec<u32>, AsmError> {
    // Pre-processing: strip comments, collect labels, keep instruction
    // lines with their original line numbers for error reporting
    let mut labels: HashMap<&str, usize> = HashMap::new();
    let mut lines: Vec<(usize, Vec<&str>)> = Vec::new();
    for (line_no, full_line) in source.lines().enumerate() {
        let line = full_line.split('#').next().unwrap_or("");
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(first) = tokens.first() else { continue };
        if let Some(name) =
            first.strip_prefix('[').and_then(|t| t.strip_suffix(']'))
        {
            // Labels index the next instruction line
            labels.insert(name, lines.len());
        } else {
            lines.push((line_no + 1, tokens));
        }
    }

    let mut program = Vec::with_capacity(lines.len());
    for (index, (line, tokens)) in lines.iter().enumerate() {
        let (mnemonic, args) = tokens.split_first().expect("line is non-empty");
        program.push(encode_line(mnemonic, args, *line, index, &labels)?);
    }
    Ok(program)
}

fn encode_line(
    mnemonic: &str,
    args: &[&str],
    line: usize,
    index: usize,
    labels: &HashMap<&str, usize>,
) -> Result<u32, AsmError> {
    Ok(match mnemonic {
        "NOP" => {
            require_args(args, 0, Some(0), line)?;
            pack(OPCODE_NOP, 0, 0, 0)
        }
        "HALT" => {
            require_args(args, 0, Some(0), line)?;
            pack(OPCODE_HALT, 0, 0, 0)
        }
        "ADD" | "SUB" | "LSHIFT" | "RSHIFT" | "COMP" | "COMPGRT" | "COMPLST" => {
            let opcode = match mnemonic {
                "ADD" => OPCODE_ADD,
                "SUB" => OPCODE_SUB,
                "LSHIFT" => OPCODE_LSHIFT,
                "RSHIFT" => OPCODE_RSHIFT,
                "COMP" => OPCODE_COMP,
                "COMPGRT" => OPCODE_COMPGRT,
                _ => OPCODE_COMPLST,
            };
            require_args(args, 3, Some(3), line)?;
            let r1 = parse_reg(args[0], line)?;
            let r2 = parse_reg(args[1], line)?;
            let r3 = parse_reg(args[2], line)?;
            pack(opcode, r1, r2, r3 as u16)
        }
        "LOAD" => {
            require_args(args, 2, None, line)?;
            let addr = parse_addr(args[0], line)?;
            let reg = parse_reg(args[1], line)?;
            pack(OPCODE_LOAD, reg, copy_flags(&args[2..], line)?, addr)
        }
        "STORE" => {
            require_args(args, 2, None, line)?;
            let reg = parse_reg(args[0], line)?;
            let addr = parse_addr(args[1], line)?;
            pack(OPCODE_STORE, reg, copy_flags(&args[2..], line)?, addr)
        }
        "JUMP" => {
            require_args(args, 2, None, line)?;
            let status = parse_reg(args[0], line)?;
            let amount = parse_amount(args[1], line, index, labels)?;
            pack(OPCODE_JMP, status, jump_flags(&args[2..], line)?, amount)
        }
        "PRINT" => {
            require_args(args, 3, Some(3), line)?;
            let r1 = parse_reg(args[0], line)?;
            let r2 = parse_reg(args[1], line)?;
            let addr = parse_addr(args[2], line)?;
            pack(OPCODE_PRINT, r1, r2, addr)
        }
        _ => {
            return Err(AsmError::UnknownMnemonic {
                line,
                token: mnemonic.to_string(),
            })
        }
    })
}

/// A jump amount: a literal displacement or a `[LABEL]` reference, which
/// encodes the line distance (the direction comes from INC/DEC)
fn parse_amount(
    token: &str,
    line: usize,
    index: usize,
    labels: &HashMap<&str, usize>,
) -> Result<u16, AsmError> {
    if let Some(name) = token.strip_prefix('[').and_then(|t| t.strip_suffix(']'))
    {
        let target = *labels.get(name).ok_or_else(|| AsmError::UnknownLabel {
            line,
            label: name.to_string(),
        })?;
        Ok(target.abs_diff(index) as u16)
    } else {
        parse_addr(token, line)
    }
}

fn copy_flags(tokens: &[&str], line: usize) -> Result<u8, AsmError> {
    fold_flags(&COPY_FLAGS, tokens, line)
}

fn jump_flags(tokens: &[&str], line: usize) -> Result<u8, AsmError> {
    fold_flags(&JUMP_FLAGS, tokens, line)
}

fn fold_flags(
    table: &[(&str, u8)],
    tokens: &[&str],
    line: usize,
) -> Result<u8, AsmError> {
    let mut flags = 0;
    for token in tokens {
        let (_, bits) = table
            .iter()
            .find(|(name, _)| name == token)
            .ok_or_else(|| AsmError::UnknownFlag {
                line,
                token: token.to_string(),
            })?;
        flags |= bits;
    }
    Ok(flags)
}
