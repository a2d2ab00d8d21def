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

// reporter.rs
//
// Renders the per-cycle instruction table and the final register dump in
// the tab-separated layout the original source printed, preserved here
// because nothing in the spec's Non-goals excludes it and losing it would
// make the simulator harder to eyeball against known-good runs.

use std::fmt::Write as _;

use crate::machine::instruction_table::InstructionTable;

fn field(value: Option<u64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "None".to_string(),
    }
}

/// One `Clock Cycle: N` block followed by one line per instruction row.
pub fn render_cycle(table: &InstructionTable, cycle: u64) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nClock Cycle: {}", cycle);
    for (idx, row) in table.rows().iter().enumerate() {
        let _ = writeln!(
            out,
            "Instr index: {}\t\tIssue: {}\t\tExec Strt: {}\t\tExec Comp: {}\t\tWrite Res: {}",
            idx,
            field(row.issue),
            field(row.exec_start),
            field(row.exec_complete),
            field(row.write_result)
        );
    }
    out
}

/// The closing summary: final cycle count, the last table once more, and
/// the full register dump in ascending name order.
pub fn render_summary(table: &InstructionTable, cycles: u64, register_values: &[(String, f64)]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nFinished at Clock Cycle: {}", cycles);
    out.push_str(&render_cycle(table, cycles));
    out.push('\n');
    for (name, value) in register_values {
        let _ = writeln!(out, "Register {}: {}", name, value);
    }
    out
}
