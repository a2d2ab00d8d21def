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

// instruction.rs
//
// Instruction record and operand types for the Tomasulo pipeline. An
// Instruction is immutable once constructed; it is shared by reference
// (via its program-order index) across the input queue, a reservation
// station, a functional-unit slot, and the instruction table.

use std::fmt;

use crate::config::Config;

/// The six opcodes this pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Ld,
    Sd,
    Addd,
    Subd,
    Multd,
    Divd,
}

impl Op {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "LD" => Some(Op::Ld),
            "SD" => Some(Op::Sd),
            "ADDD" => Some(Op::Addd),
            "SUBD" => Some(Op::Subd),
            "MULTD" => Some(Op::Multd),
            "DIVD" => Some(Op::Divd),
            _ => None,
        }
    }

    pub fn latency(self, config: &Config) -> u32 {
        match self {
            Op::Ld => config.load_latency,
            Op::Sd => config.store_latency,
            Op::Addd => config.add_latency,
            Op::Subd => config.sub_latency,
            Op::Multd => config.mult_latency,
            Op::Divd => config.div_latency,
        }
    }

    pub fn station_class(self) -> StationClass {
        match self {
            Op::Ld => StationClass::Load,
            Op::Sd => StationClass::Store,
            Op::Addd | Op::Subd => StationClass::Add,
            Op::Multd | Op::Divd => StationClass::Mult,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Op::Ld => "LD",
            Op::Sd => "SD",
            Op::Addd => "ADDD",
            Op::Subd => "SUBD",
            Op::Multd => "MULTD",
            Op::Divd => "DIVD",
        };
        write!(f, "{}", s)
    }
}

/// Which reservation-station pool (and functional unit) an instruction
/// belongs to. Also used as the "class" half of a Tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StationClass {
    Load,
    Store,
    Add,
    Mult,
}

/// An operand is either a register name or an immediate value captured
/// at parse time (trailing `+`/`-` sign already applied).
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Register(String),
    Immediate(i64),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(name) => write!(f, "{}", name),
            Operand::Immediate(value) => write!(f, "{}", value),
        }
    }
}

/// An immutable instruction record in program order.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub index: usize,
    pub op: Op,
    pub dest: String,
    pub operand1: Operand,
    pub operand2: Operand,
    pub latency: u32,
}

impl Instruction {
    pub fn new(index: usize, op: Op, dest: String, operand1: Operand, operand2: Operand, config: &Config) -> Self {
        let latency = op.latency(config);
        Self { index, op, dest, operand1, operand2, latency }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.op, self.dest, self.operand1, self.operand2)
    }
}
