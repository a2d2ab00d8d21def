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

use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum SimulatorError {
    // Parse errors
    ParseError { line: usize, token: String, reason: String },
    UnknownOpcode { line: usize, opcode: String },

    // Structural errors
    StationIndexOutOfRange(usize),
    ArithmeticUnitHasNoIndex,

    // Consistency errors
    MissingProducerTag { register: String },
    MonotonicityViolation { instr_index: usize, field: &'static str },

    // System errors
    IoError(std::io::Error),
}

impl fmt::Display for SimulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulatorError::ParseError { line, token, reason } => {
                write!(f, "parse error at line {}: token '{}': {}", line, token, reason)
            },
            SimulatorError::UnknownOpcode { line, opcode } => {
                write!(f, "unknown opcode '{}' at line {}", opcode, line)
            },
            SimulatorError::StationIndexOutOfRange(idx) => {
                write!(f, "station/slot index {} is out of range", idx)
            },
            SimulatorError::ArithmeticUnitHasNoIndex => {
                write!(f, "attempted to empty an arithmetic unit using an explicit index")
            },
            SimulatorError::MissingProducerTag { register } => {
                write!(f, "found no producer tag at destination register {}", register)
            },
            SimulatorError::MonotonicityViolation { instr_index, field } => {
                write!(
                    f,
                    "monotonicity violation: instruction {} field '{}' was already stamped",
                    instr_index, field
                )
            },
            SimulatorError::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl Error for SimulatorError {}

impl From<std::io::Error> for SimulatorError {
    fn from(error: std::io::Error) -> Self {
        SimulatorError::IoError(error)
    }
}
