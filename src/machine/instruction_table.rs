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

// instruction_table.rs
//
// The authoritative per-instruction record: one row per instruction in
// program order, holding the four stage cycles it passed through. Every
// field is written exactly once; a second write is a bug in the scheduler,
// not a recoverable condition.

use crate::errors::SimulatorError;
use crate::instruction::Instruction;

#[derive(Debug, Clone)]
pub struct InstructionRow {
    pub instruction: Instruction,
    pub issue: Option<u64>,
    pub exec_start: Option<u64>,
    pub exec_complete: Option<u64>,
    pub write_result: Option<u64>,
}

impl InstructionRow {
    fn new(instruction: Instruction) -> Self {
        Self { instruction, issue: None, exec_start: None, exec_complete: None, write_result: None }
    }

    pub fn is_complete(&self) -> bool {
        self.issue.is_some()
            && self.exec_start.is_some()
            && self.exec_complete.is_some()
            && self.write_result.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct InstructionTable {
    rows: Vec<InstructionRow>,
}

fn stamp(
    field: &mut Option<u64>,
    cycle: u64,
    instr_index: usize,
    field_name: &'static str,
) -> Result<(), SimulatorError> {
    if field.is_some() {
        return Err(SimulatorError::MonotonicityViolation { instr_index, field: field_name });
    }
    *field = Some(cycle);
    Ok(())
}

impl InstructionTable {
    pub fn new(instructions: &[Instruction]) -> Self {
        Self { rows: instructions.iter().cloned().map(InstructionRow::new).collect() }
    }

    pub fn rows(&self) -> &[InstructionRow] {
        &self.rows
    }

    pub fn set_issue(&mut self, idx: usize, cycle: u64) -> Result<(), SimulatorError> {
        stamp(&mut self.rows[idx].issue, cycle, idx, "issue")
    }

    pub fn set_exec_start(&mut self, idx: usize, cycle: u64) -> Result<(), SimulatorError> {
        stamp(&mut self.rows[idx].exec_start, cycle, idx, "exec_start")
    }

    pub fn set_exec_complete(&mut self, idx: usize, cycle: u64) -> Result<(), SimulatorError> {
        stamp(&mut self.rows[idx].exec_complete, cycle, idx, "exec_complete")
    }

    pub fn set_write_result(&mut self, idx: usize, cycle: u64) -> Result<(), SimulatorError> {
        stamp(&mut self.rows[idx].write_result, cycle, idx, "write_result")
    }

    pub fn is_incomplete(&self) -> bool {
        self.rows.iter().any(|r| !r.is_complete())
    }
}
