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

// reservation_station.rs
//
// Reservation stations hold an issued-but-not-yet-executed instruction
// along with its operand values or producer tags. Four pools exist (load,
// store, add, mult); station indices are local to a pool (0-based) and the
// Machine maps (class, local index) to the globally unique index used for
// CDB tie-break ordering.

use crate::instruction::{Instruction, Op, Operand, StationClass};
use crate::machine::register_file::RegisterFile;
use crate::machine::tag::Tag;

#[derive(Debug, Clone)]
pub struct ReservationStation {
    pub busy: bool,
    pub op: Option<Op>,
    pub dest: Option<String>,
    pub qj: Tag,
    pub vj: Option<f64>,
    pub qk: Tag,
    pub vk: Option<f64>,
    pub ready: bool,
    pub instruction_index: Option<usize>,
}

impl ReservationStation {
    fn new() -> Self {
        Self {
            busy: false,
            op: None,
            dest: None,
            qj: Tag::empty(),
            vj: None,
            qk: Tag::empty(),
            vk: None,
            ready: false,
            instruction_index: None,
        }
    }

    fn reset(&mut self) {
        *self = ReservationStation::new();
    }

    /// True iff both operands are captured as values. Does not consider
    /// destination-rename or functional-unit availability; see
    /// `Machine::station_is_eligible` for the full §4.3 ready predicate.
    pub fn operands_captured(&self) -> bool {
        self.busy && self.qj.is_empty() && self.qk.is_empty()
    }
}

/// One of the four reservation-station pools (load, store, add, mult).
#[derive(Debug, Clone)]
pub struct ReservationStationPool {
    pub class: StationClass,
    pub stations: Vec<ReservationStation>,
}

fn capture_operand(operand: &Operand, register_file: &RegisterFile) -> (Tag, Option<f64>) {
    match operand {
        Operand::Immediate(value) => (Tag::empty(), Some(*value as f64)),
        Operand::Register(name) => {
            let tag = register_file.read_tag(name);
            if tag.is_empty() {
                (Tag::empty(), Some(register_file.read_value(name)))
            } else {
                (tag, None)
            }
        },
    }
}

impl ReservationStationPool {
    pub fn new(class: StationClass, count: usize) -> Self {
        Self { class, stations: (0..count).map(|_| ReservationStation::new()).collect() }
    }

    pub fn first_free_index(&self) -> Option<usize> {
        self.stations.iter().position(|s| !s.busy)
    }

    pub fn occupied_indices(&self) -> Vec<usize> {
        self.stations.iter().enumerate().filter(|(_, s)| s.busy).map(|(i, _)| i).collect()
    }

    /// Populates the station at `local_idx` per §4.3's issue rules and
    /// publishes `own_tag` as the destination register's new producer.
    pub fn issue(
        &mut self,
        local_idx: usize,
        instr: &Instruction,
        own_tag: Tag,
        register_file: &mut RegisterFile,
    ) {
        let (qj, vj) = capture_operand(&instr.operand1, register_file);
        let (qk, vk) = capture_operand(&instr.operand2, register_file);

        let station = &mut self.stations[local_idx];
        station.busy = true;
        station.op = Some(instr.op);
        station.dest = Some(instr.dest.clone());
        station.instruction_index = Some(instr.index);
        station.qj = qj;
        station.vj = vj;
        station.qk = qk;
        station.vk = vk;
        station.ready = false;

        register_file.set_producer(&instr.dest, own_tag);
    }

    pub fn clear(&mut self, local_idx: usize) {
        self.stations[local_idx].reset();
    }

    /// Scans every busy station in this pool and forwards `value` into
    /// any operand slot whose tag equals `tag`, clearing that tag.
    pub fn forward(&mut self, tag: Tag, value: f64) {
        for station in self.stations.iter_mut().filter(|s| s.busy) {
            if station.qj == tag {
                station.vj = Some(value);
                station.qj = Tag::empty();
            }
            if station.qk == tag {
                station.vk = Some(value);
                station.qk = Tag::empty();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_default() -> crate::config::Config {
        crate::config::Config::default()
    }

    #[test]
    fn issue_captures_immediate_operands_directly() {
        let mut rf = RegisterFile::new(2.0);
        let cfg = config_default();
        let instr = Instruction::new(
            0,
            Op::Ld,
            "F0".into(),
            Operand::Immediate(34),
            Operand::Immediate(0),
            &cfg,
        );
        let mut pool = ReservationStationPool::new(StationClass::Load, 3);
        pool.issue(0, &instr, Tag::new(StationClass::Load, 0), &mut rf);
        let st = &pool.stations[0];
        assert!(st.busy);
        assert_eq!(st.vj, Some(34.0));
        assert!(st.qj.is_empty());
        assert_eq!(st.vk, Some(0.0));
    }

    #[test]
    fn issue_captures_pending_tag_when_operand_register_has_producer() {
        let mut rf = RegisterFile::new(2.0);
        let cfg = config_default();
        rf.set_producer("F0", Tag::new(StationClass::Load, 0));
        let instr = Instruction::new(
            2,
            Op::Addd,
            "F4".into(),
            Operand::Register("F0".into()),
            Operand::Register("F2".into()),
            &cfg,
        );
        let mut pool = ReservationStationPool::new(StationClass::Add, 3);
        pool.issue(0, &instr, Tag::new(StationClass::Add, 0), &mut rf);
        let st = &pool.stations[0];
        assert_eq!(st.qj, Tag::new(StationClass::Load, 0));
        assert_eq!(st.vj, None);
        assert!(st.qk.is_empty());
        assert_eq!(st.vk, Some(2.0));
    }

    #[test]
    fn forward_clears_only_matching_tag() {
        let mut rf = RegisterFile::new(2.0);
        let cfg = config_default();
        let t0 = Tag::new(StationClass::Load, 0);
        let t1 = Tag::new(StationClass::Load, 1);
        rf.set_producer("F0", t0);
        rf.set_producer("F2", t1);
        let instr = Instruction::new(
            2,
            Op::Addd,
            "F4".into(),
            Operand::Register("F0".into()),
            Operand::Register("F2".into()),
            &cfg,
        );
        let mut pool = ReservationStationPool::new(StationClass::Add, 3);
        pool.issue(0, &instr, Tag::new(StationClass::Add, 0), &mut rf);
        pool.forward(t0, 2.0);
        assert!(pool.stations[0].qj.is_empty());
        assert_eq!(pool.stations[0].vj, Some(2.0));
        assert_eq!(pool.stations[0].qk, t1);
    }
}
