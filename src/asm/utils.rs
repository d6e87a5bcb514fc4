//! Argument parsing helpers for the assembler

use crate::error::AsmError;

/// Parses a numeric argument in decimal, `B`-prefixed binary or `0x` hex.
/// The value must be strictly below `max`.
pub fn parse_value(token: &str, max: u64, line: usize) -> Result<u64, AsmError> {
    let parsed = if let Some(bits) = token.strip_prefix('B') {
        u64::from_str_radix(bits, 2)
    } else if let Some(hex) = token.strip_prefix("0x") {
        u64::from_str_radix(hex, 16)
    } else {
        token.parse::<u64>()
    };

    let value = parsed.map_err(|_| AsmError::BadArgument {
        line,
        token: token.to_string(),
    })?;
    if value >= max {
        return Err(AsmError::ArgumentOutOfRange { line, value, max });
    }
    Ok(value)
}

/// Parses a 5-bit register index
pub fn parse_reg(token: &str, line: usize) -> Result<u8, AsmError> {
    Ok(parse_value(token, 32, line)? as u8)
}

/// Parses a 16-bit address or literal
pub fn parse_addr(token: &str, line: usize) -> Result<u16, AsmError> {
    Ok(parse_value(token, 1 << 16, line)? as u16)
}

/// Checks the argument count against an inclusive range;
/// `max` of `None` allows trailing flag tokens
pub fn require_args(
    args: &[&str],
    min: usize,
    max: Option<usize>,
    line: usize,
) -> Result<(), AsmError> {
    let expected = match max {
        Some(max) if max == min => format!("{min}"),
        Some(max) => format!("{min} to {max}"),
        None => format!("at least {min}"),
    };
    let ok = args.len() >= min && max.map_or(true, |max| args.len() <= max);
    if !ok {
        return Err(AsmError::WrongArgumentCount {
            line,
            expected,
            given: args.len(),
        });
    }
    Ok(())
}
