// Copyright (c) 2024 Vivek Poovathoor
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

// reader.rs
//
// Parses the external instruction-stream text format: one instruction per
// line, `<OPCODE> <DEST> <OPERAND1> <OPERAND2>`. A token is an immediate
// only if it is a run of digits optionally followed by a trailing `+`/`-`
// sign (the sign negates, it never marks a register); any other token,
// sign-suffixed or not, is a register name taken verbatim. Blank lines
// and `#`-prefixed comments are skipped, which the original source's
// line-at-a-time reader did not support but costs nothing here.

use std::io::BufRead;

use crate::config::Config;
use crate::errors::SimulatorError;
use crate::instruction::{Instruction, Op, Operand};

pub const DEFAULT_INPUT_FILENAME: &str = "instruction_input.txt";

fn parse_operand(token: &str, line: usize) -> Result<Operand, SimulatorError> {
    if token.is_empty() {
        return Err(SimulatorError::ParseError {
            line,
            token: token.to_string(),
            reason: "empty operand token".into(),
        });
    }
    let last = token.chars().last().expect("checked non-empty above");
    let (body, sign) = match last {
        '+' | '-' => (&token[..token.len() - 1], last),
        _ => (token, '+'),
    };
    if !body.is_empty() && body.chars().all(|c| c.is_ascii_digit()) {
        let magnitude: i64 = body.parse().map_err(|_| SimulatorError::ParseError {
            line,
            token: token.to_string(),
            reason: "immediate magnitude does not fit in i64".into(),
        })?;
        let value = if sign == '-' { -magnitude } else { magnitude };
        Ok(Operand::Immediate(value))
    } else {
        Ok(Operand::Register(token.to_string()))
    }
}

/// Parses every instruction in `source`, in program order. A line is
/// skipped if blank or if its first non-whitespace character is `#`.
pub fn read_instructions(source: impl BufRead, config: &Config) -> Result<Vec<Instruction>, SimulatorError> {
    let mut instructions = Vec::new();
    for (line_no, raw) in source.lines().enumerate() {
        let raw = raw?;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 4 {
            return Err(SimulatorError::ParseError {
                line: line_no + 1,
                token: line.to_string(),
                reason: format!("expected 4 whitespace-separated fields, found {}", tokens.len()),
            });
        }
        let op = Op::from_str(tokens[0]).ok_or_else(|| SimulatorError::UnknownOpcode {
            line: line_no + 1,
            opcode: tokens[0].to_string(),
        })?;
        let dest = tokens[1].to_string();
        let operand1 = parse_operand(tokens[2], line_no + 1)?;
        let operand2 = parse_operand(tokens[3], line_no + 1)?;
        let index = instructions.len();
        instructions.push(Instruction::new(index, op, dest, operand1, operand2, config));
    }
    Ok(instructions)
}
