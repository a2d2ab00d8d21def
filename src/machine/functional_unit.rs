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

// functional_unit.rs
//
// The circuits that actually spend cycles executing an instruction once a
// reservation station is ready. Add and mult are single-slot arithmetic
// units; load and store are N-slot buffers whose slot index is assumed to
// coincide with the station index of the instruction it holds (buffer and
// reservation station are the same physical resource).

use crate::errors::SimulatorError;
use crate::instruction::Instruction;

/// A single occupant of a functional unit: the instruction being executed,
/// the cycle execution started, and the station that issued it.
#[derive(Debug, Clone)]
struct Occupant {
    instruction: Instruction,
    start_cycle: u64,
    station_idx: usize,
}

impl Occupant {
    fn is_complete(&self, now: u64) -> bool {
        now - self.start_cycle + 1 == self.instruction.latency as u64
    }
}

/// Add or mult: exactly one instruction in flight at a time.
#[derive(Debug, Clone, Default)]
pub struct ArithmeticUnit {
    occupant: Option<Occupant>,
}

impl ArithmeticUnit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        self.occupant.is_none()
    }

    pub fn load(&mut self, instruction: Instruction, start_cycle: u64, station_idx: usize) {
        self.occupant = Some(Occupant { instruction, start_cycle, station_idx });
    }

    pub fn empty(&mut self) {
        self.occupant = None;
    }

    pub fn station_idx(&self) -> Option<usize> {
        self.occupant.as_ref().map(|o| o.station_idx)
    }

    pub fn instruction(&self) -> Option<&Instruction> {
        self.occupant.as_ref().map(|o| &o.instruction)
    }

    pub fn is_complete(&self, now: u64) -> bool {
        self.occupant.as_ref().is_some_and(|o| o.is_complete(now))
    }
}

/// Load or store: N independent slots, each tracking its own occupant.
#[derive(Debug, Clone)]
pub struct MemoryBuffer {
    slots: Vec<Option<Occupant>>,
}

impl MemoryBuffer {
    pub fn new(num_slots: usize) -> Self {
        Self { slots: vec![None; num_slots] }
    }

    pub fn find_empty_slot(&self) -> Option<usize> {
        self.slots.iter().position(|s| s.is_none())
    }

    pub fn load(&mut self, instruction: Instruction, start_cycle: u64, station_idx: usize) {
        if let Some(idx) = self.find_empty_slot() {
            self.slots[idx] = Some(Occupant { instruction, start_cycle, station_idx });
        }
    }

    /// Clears the slot whose captured station index matches `station_idx`.
    pub fn empty(&mut self, station_idx: usize) -> Result<(), SimulatorError> {
        let slot = self
            .slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|o| o.station_idx == station_idx))
            .ok_or(SimulatorError::StationIndexOutOfRange(station_idx))?;
        self.slots[slot] = None;
        Ok(())
    }

    pub fn occupied_slots(&self) -> Vec<usize> {
        self.slots.iter().enumerate().filter(|(_, s)| s.is_some()).map(|(i, _)| i).collect()
    }

    pub fn station_idx_at(&self, slot: usize) -> Option<usize> {
        self.slots[slot].as_ref().map(|o| o.station_idx)
    }

    pub fn instruction_at(&self, slot: usize) -> Option<&Instruction> {
        self.slots[slot].as_ref().map(|o| &o.instruction)
    }

    pub fn is_complete(&self, slot: usize, now: u64) -> bool {
        self.slots[slot].as_ref().is_some_and(|o| o.is_complete(now))
    }
}
