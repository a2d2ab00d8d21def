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

// mod.rs
//
// `Machine` is the per-cycle scheduler: the hard part of this crate. It
// owns one `Config`, one `RegisterFile`, the four reservation-station
// pools, the four functional units, the instruction table, and the
// broadcast queue, and drives them through the four ordered phases of
// §4.6 every clock cycle. Replaces the original source's module-scope
// singletons (register file, pools, units) with a value constructed
// per simulation run, so independent `Machine`s never share state.

pub mod functional_unit;
pub mod instruction_table;
pub mod register_file;
pub mod reservation_station;
pub mod tag;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::Config;
use crate::errors::SimulatorError;
use crate::instruction::{Instruction, Op, StationClass};
use functional_unit::{ArithmeticUnit, MemoryBuffer};
use instruction_table::InstructionTable;
use register_file::RegisterFile;
use reservation_station::{ReservationStation, ReservationStationPool};
use tag::Tag;

/// A functional unit occurrence awaiting its CDB slot: the pool/index that
/// produced it plus the instruction's program-order index, carried so
/// write-result can look everything else up from the instruction table.
#[derive(Debug, Clone, Copy)]
struct BroadcastEntry {
    class: StationClass,
    local_idx: usize,
    instr_index: usize,
}

/// The outcome of driving a `Machine` to completion or interruption.
pub struct RunOutcome {
    pub table: InstructionTable,
    pub cycles: u64,
    pub interrupted: bool,
    pub register_values: Vec<(String, f64)>,
}

pub struct Machine {
    config: Config,
    register_file: RegisterFile,
    loads: ReservationStationPool,
    stores: ReservationStationPool,
    adds: ReservationStationPool,
    mults: ReservationStationPool,
    add_unit: ArithmeticUnit,
    mult_unit: ArithmeticUnit,
    load_unit: MemoryBuffer,
    store_unit: MemoryBuffer,
    table: InstructionTable,
    broadcast_queue: Vec<BroadcastEntry>,
}

impl Machine {
    pub fn new(config: Config) -> Self {
        Self {
            loads: ReservationStationPool::new(StationClass::Load, config.num_load_stations),
            stores: ReservationStationPool::new(StationClass::Store, config.num_store_stations),
            adds: ReservationStationPool::new(StationClass::Add, config.num_add_stations),
            mults: ReservationStationPool::new(StationClass::Mult, config.num_mult_stations),
            add_unit: ArithmeticUnit::new(),
            mult_unit: ArithmeticUnit::new(),
            load_unit: MemoryBuffer::new(config.num_load_stations),
            store_unit: MemoryBuffer::new(config.num_store_stations),
            register_file: RegisterFile::new(config.default_register_value),
            table: InstructionTable::new(&[]),
            broadcast_queue: Vec::new(),
            config,
        }
    }

    /// Drives the scheduler loop of §4.6 to completion, calling `on_cycle`
    /// once per cycle after phase D (the reporter's hook). If `interrupt`
    /// is supplied and is cleared mid-run, stops issuing new cycles and
    /// returns an interrupted outcome with whatever state exists so far.
    pub fn run(
        &mut self,
        instructions: Vec<Instruction>,
        interrupt: Option<&AtomicBool>,
        mut on_cycle: impl FnMut(&InstructionTable, u64),
    ) -> Result<RunOutcome, SimulatorError> {
        self.table = InstructionTable::new(&instructions);
        let mut queue: VecDeque<Instruction> = instructions.into_iter().collect();
        let mut clock: u64 = 0;
        let mut interrupted = false;

        while !queue.is_empty() || self.table.is_incomplete() {
            if let Some(flag) = interrupt {
                if !flag.load(Ordering::SeqCst) {
                    interrupted = true;
                    break;
                }
            }
            clock += 1;
            log::trace!("cycle {} begin", clock);
            self.phase_write_result(clock)?;
            self.phase_issue(&mut queue, clock)?;
            self.phase_start_execute(clock)?;
            self.phase_complete_execute(clock)?;
            on_cycle(&self.table, clock);
        }

        log::info!(
            "simulation {} after {} cycles",
            if interrupted { "interrupted" } else { "finished" },
            clock
        );

        Ok(RunOutcome {
            table: self.table.clone(),
            cycles: clock,
            interrupted,
            register_values: self.register_file.sorted_values(),
        })
    }

    /// True once every register's producer tag has cleared — part of the
    /// termination invariant of §8.
    pub fn register_file_tags_are_empty(&self) -> bool {
        self.register_file.all_tags_empty()
    }

    /// True once every reservation station across all four pools is free.
    pub fn every_station_is_free(&self) -> bool {
        self.loads.occupied_indices().is_empty()
            && self.stores.occupied_indices().is_empty()
            && self.adds.occupied_indices().is_empty()
            && self.mults.occupied_indices().is_empty()
    }

    fn global_index(&self, class: StationClass, local_idx: usize) -> usize {
        match class {
            StationClass::Load => local_idx,
            StationClass::Store => self.config.num_load_stations + local_idx,
            StationClass::Add => self.config.num_load_stations + self.config.num_store_stations + local_idx,
            StationClass::Mult => {
                self.config.num_load_stations
                    + self.config.num_store_stations
                    + self.config.num_add_stations
                    + local_idx
            },
        }
    }

    fn pool(&self, class: StationClass) -> &ReservationStationPool {
        match class {
            StationClass::Load => &self.loads,
            StationClass::Store => &self.stores,
            StationClass::Add => &self.adds,
            StationClass::Mult => &self.mults,
        }
    }

    fn station(&self, class: StationClass, idx: usize) -> &ReservationStation {
        &self.pool(class).stations[idx]
    }

    /// §4.3's ready predicate: operands captured, no later rename has
    /// superseded this station's claim on its destination, and the
    /// functional unit has a slot free.
    fn station_is_eligible(&self, class: StationClass, idx: usize) -> bool {
        let station = self.station(class, idx);
        if !station.operands_captured() {
            return false;
        }
        let dest = station.dest.as_ref().expect("busy station always has a dest");
        if self.register_file.read_tag(dest) != Tag::new(class, idx) {
            return false;
        }
        match class {
            StationClass::Add => self.add_unit.is_available(),
            StationClass::Mult => self.mult_unit.is_available(),
            StationClass::Load => self.load_unit.find_empty_slot().is_some(),
            StationClass::Store => self.store_unit.find_empty_slot().is_some(),
        }
    }

    /// Phase A — at most one broadcast commits per cycle. The completing
    /// station's own (class, local index) is its tag T — not whatever the
    /// register file currently holds for the destination, which may have
    /// moved on to a later WAW renaming. Register-file commit and tag
    /// clearing are gated on T still being the *current* producer so a
    /// stale completion can never clobber a newer one; forwarding to this
    /// station's own dependents happens unconditionally, since they
    /// captured T specifically and are owed its value regardless of any
    /// later rename.
    fn phase_write_result(&mut self, clock: u64) -> Result<(), SimulatorError> {
        if self.broadcast_queue.is_empty() {
            return Ok(());
        }
        let selected = self.select_broadcast_entry();
        let entry = self.broadcast_queue.remove(selected);
        let BroadcastEntry { class, local_idx, instr_index } = entry;
        let tag = Tag::new(class, local_idx);

        let dest = self.table.rows()[instr_index].instruction.dest.clone();
        if self.register_file.read_tag(&dest).is_empty() {
            log::error!("no producer tag at destination register {}", dest);
            return Err(SimulatorError::MissingProducerTag { register: dest });
        }

        let (op, vj, vk) = {
            let station = self.station(class, local_idx);
            (station.op.expect("busy station has an op"), station.vj, station.vk)
        };
        let value = compute_value(op, vj, vk);

        self.table.set_write_result(instr_index, clock)?;
        if self.register_file.read_tag(&dest) == tag {
            self.register_file.write_value(&dest, value);
        }

        self.loads.forward(tag, value);
        self.stores.forward(tag, value);
        self.adds.forward(tag, value);
        self.mults.forward(tag, value);

        self.register_file.clear_tag(&dest, tag);

        match class {
            StationClass::Add => self.add_unit.empty(),
            StationClass::Mult => self.mult_unit.empty(),
            StationClass::Load => self.load_unit.empty(local_idx)?,
            StationClass::Store => self.store_unit.empty(local_idx)?,
        }

        match class {
            StationClass::Load => self.loads.clear(local_idx),
            StationClass::Store => self.stores.clear(local_idx),
            StationClass::Add => self.adds.clear(local_idx),
            StationClass::Mult => self.mults.clear(local_idx),
        }

        log::debug!("cycle {}: write-result {:?}[{}] -> {}", clock, class, local_idx, dest);
        Ok(())
    }

    /// Smallest global station index wins; ties broken by queue order,
    /// which `Vec::remove` preserves for the untouched entries.
    fn select_broadcast_entry(&self) -> usize {
        let mut best = 0;
        let mut best_global = self.global_index(self.broadcast_queue[0].class, self.broadcast_queue[0].local_idx);
        for (i, entry) in self.broadcast_queue.iter().enumerate().skip(1) {
            let global = self.global_index(entry.class, entry.local_idx);
            if global < best_global {
                best = i;
                best_global = global;
            }
        }
        best
    }

    /// Phase B — at most one instruction issued per cycle.
    fn phase_issue(&mut self, queue: &mut VecDeque<Instruction>, clock: u64) -> Result<(), SimulatorError> {
        let Some(head) = queue.front() else { return Ok(()) };
        let class = head.op.station_class();
        let free = match class {
            StationClass::Load => self.loads.first_free_index(),
            StationClass::Store => self.stores.first_free_index(),
            StationClass::Add => self.adds.first_free_index(),
            StationClass::Mult => self.mults.first_free_index(),
        };
        let Some(local_idx) = free else {
            log::debug!("cycle {}: issue stalled, no free {:?} station", clock, class);
            return Ok(());
        };

        let instr = queue.pop_front().expect("front already checked");
        let own_tag = Tag::new(class, local_idx);
        match class {
            StationClass::Load => self.loads.issue(local_idx, &instr, own_tag, &mut self.register_file),
            StationClass::Store => self.stores.issue(local_idx, &instr, own_tag, &mut self.register_file),
            StationClass::Add => self.adds.issue(local_idx, &instr, own_tag, &mut self.register_file),
            StationClass::Mult => self.mults.issue(local_idx, &instr, own_tag, &mut self.register_file),
        }
        self.table.set_issue(instr.index, clock)?;
        log::debug!("cycle {}: issue instr {} into {:?}[{}]", clock, instr.index, class, local_idx);
        Ok(())
    }

    /// Phase C — any station whose *stored* ready flag (set by a prior
    /// cycle's recompute) is true, and whose unit is free right now,
    /// starts execution; every other busy station gets its ready flag
    /// recomputed for next cycle's check. This stored-flag indirection is
    /// what gives a station exactly one idle cycle between issue and the
    /// earliest possible exec-start: a station issued this cycle always
    /// has ready=false until the end of this cycle's recompute pass.
    fn phase_start_execute(&mut self, clock: u64) -> Result<(), SimulatorError> {
        let mut entries: Vec<(usize, StationClass, usize)> = Vec::new();
        for idx in self.loads.occupied_indices() {
            entries.push((self.global_index(StationClass::Load, idx), StationClass::Load, idx));
        }
        for idx in self.stores.occupied_indices() {
            entries.push((self.global_index(StationClass::Store, idx), StationClass::Store, idx));
        }
        for idx in self.adds.occupied_indices() {
            entries.push((self.global_index(StationClass::Add, idx), StationClass::Add, idx));
        }
        for idx in self.mults.occupied_indices() {
            entries.push((self.global_index(StationClass::Mult, idx), StationClass::Mult, idx));
        }
        entries.sort_by_key(|e| e.0);

        for (_, class, idx) in entries {
            let instr_index = self.station(class, idx).instruction_index.expect("busy station has an instruction");
            let exec_start_empty = self.table.rows()[instr_index].exec_start.is_none();
            let stored_ready = self.station(class, idx).ready;
            let unit_has_slot = match class {
                StationClass::Add => self.add_unit.is_available(),
                StationClass::Mult => self.mult_unit.is_available(),
                StationClass::Load => self.load_unit.find_empty_slot().is_some(),
                StationClass::Store => self.store_unit.find_empty_slot().is_some(),
            };

            if stored_ready && unit_has_slot && exec_start_empty {
                let instr = self.table.rows()[instr_index].instruction.clone();
                match class {
                    StationClass::Add => self.add_unit.load(instr, clock, idx),
                    StationClass::Mult => self.mult_unit.load(instr, clock, idx),
                    StationClass::Load => self.load_unit.load(instr, clock, idx),
                    StationClass::Store => self.store_unit.load(instr, clock, idx),
                }
                self.table.set_exec_start(instr_index, clock)?;
                log::debug!("cycle {}: exec-start instr {} in {:?}[{}]", clock, instr_index, class, idx);
            } else {
                let recomputed = self.station_is_eligible(class, idx);
                match class {
                    StationClass::Load => self.loads.stations[idx].ready = recomputed,
                    StationClass::Store => self.stores.stations[idx].ready = recomputed,
                    StationClass::Add => self.adds.stations[idx].ready = recomputed,
                    StationClass::Mult => self.mults.stations[idx].ready = recomputed,
                }
            }
        }
        Ok(())
    }

    /// Phase D — any unit whose latency has elapsed completes and queues
    /// for broadcast.
    fn phase_complete_execute(&mut self, clock: u64) -> Result<(), SimulatorError> {
        if self.add_unit.is_complete(clock) {
            let instr_index = self.add_unit.instruction().expect("complete implies occupied").index;
            let local_idx = self.add_unit.station_idx().expect("complete implies occupied");
            self.table.set_exec_complete(instr_index, clock)?;
            self.broadcast_queue.push(BroadcastEntry { class: StationClass::Add, local_idx, instr_index });
        }
        if self.mult_unit.is_complete(clock) {
            let instr_index = self.mult_unit.instruction().expect("complete implies occupied").index;
            let local_idx = self.mult_unit.station_idx().expect("complete implies occupied");
            self.table.set_exec_complete(instr_index, clock)?;
            self.broadcast_queue.push(BroadcastEntry { class: StationClass::Mult, local_idx, instr_index });
        }
        for slot in self.load_unit.occupied_slots() {
            if self.load_unit.is_complete(slot, clock) {
                let instr_index = self.load_unit.instruction_at(slot).expect("occupied slot").index;
                let local_idx = self.load_unit.station_idx_at(slot).expect("occupied slot");
                self.table.set_exec_complete(instr_index, clock)?;
                self.broadcast_queue.push(BroadcastEntry { class: StationClass::Load, local_idx, instr_index });
            }
        }
        for slot in self.store_unit.occupied_slots() {
            if self.store_unit.is_complete(slot, clock) {
                let instr_index = self.store_unit.instruction_at(slot).expect("occupied slot").index;
                let local_idx = self.store_unit.station_idx_at(slot).expect("occupied slot");
                self.table.set_exec_complete(instr_index, clock)?;
                self.broadcast_queue.push(BroadcastEntry { class: StationClass::Store, local_idx, instr_index });
            }
        }
        Ok(())
    }
}

/// The station's arithmetic. LD/SD have no real memory model, so their
/// "loaded"/"stored" value is just the captured first operand: enough to
/// keep the CDB/commit machinery — and RAW consumers of LD's destination —
/// uniform across every opcode, the way the original source's unconditional
/// `execute_station_op` / `load_register_value` pairing does for every op.
fn compute_value(op: Op, vj: Option<f64>, vk: Option<f64>) -> f64 {
    let vj = vj.unwrap_or(0.0);
    let vk = vk.unwrap_or(0.0);
    match op {
        Op::Addd => vj + vk,
        Op::Subd => vj - vk,
        Op::Multd => vj * vk,
        Op::Divd => vj / vk,
        Op::Ld | Op::Sd => vj,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Operand;

    fn ld(index: usize, dest: &str, a: i64, b: i64, config: &Config) -> Instruction {
        Instruction::new(index, Op::Ld, dest.into(), Operand::Immediate(a), Operand::Immediate(b), config)
    }

    fn reg(index: usize, op: Op, dest: &str, op1: &str, op2: &str, config: &Config) -> Instruction {
        Instruction::new(
            index,
            op,
            dest.into(),
            Operand::Register(op1.into()),
            Operand::Register(op2.into()),
            config,
        )
    }

    /// S1 — a single independent LD.
    #[test]
    fn single_independent_load() {
        let config = Config::default();
        let program = vec![ld(0, "F0", 34, 0, &config)];
        let mut machine = Machine::new(config);
        let outcome = machine.run(program, None, |_, _| {}).unwrap();
        let row = &outcome.table.rows()[0];
        assert_eq!(row.issue, Some(1));
        assert_eq!(row.exec_start, Some(2));
        assert_eq!(row.exec_complete, Some(4));
        assert_eq!(row.write_result, Some(5));
    }

    /// S2 — ADDD with a RAW dependency on both operands, fed by two LDs.
    #[test]
    fn addd_raw_dependency_on_two_loads() {
        let config = Config::default();
        let program = vec![
            ld(0, "F0", 34, 0, &config),
            ld(1, "F2", 45, 0, &config),
            reg(2, Op::Addd, "F4", "F0", "F2", &config),
        ];
        let mut machine = Machine::new(config);
        let outcome = machine.run(program, None, |_, _| {}).unwrap();
        let rows = outcome.table.rows();
        assert_eq!((rows[0].issue, rows[0].exec_start, rows[0].exec_complete, rows[0].write_result), (Some(1), Some(2), Some(4), Some(5)));
        assert_eq!((rows[1].issue, rows[1].exec_start, rows[1].exec_complete, rows[1].write_result), (Some(2), Some(3), Some(5), Some(6)));
        assert_eq!((rows[2].issue, rows[2].exec_start, rows[2].exec_complete, rows[2].write_result), (Some(3), Some(7), Some(8), Some(9)));
    }

    /// S3 — WAW renaming: a second LD to the same register supersedes the
    /// first; the dependent ADDD must see the second LD's value.
    #[test]
    fn waw_renaming_uses_second_writer() {
        let config = Config::default();
        let program = vec![
            ld(0, "F0", 10, 0, &config),
            ld(1, "F0", 20, 0, &config),
            reg(2, Op::Addd, "F4", "F0", "F2", &config),
        ];
        let mut machine = Machine::new(config);
        let outcome = machine.run(program, None, |_, _| {}).unwrap();
        // F0's final committed value comes from the second LD (20), not the first (10).
        let f0 = outcome.register_values.iter().find(|(name, _)| name == "F0").unwrap().1;
        assert_eq!(f0, 20.0);
        // The ADDD's exec_start must follow the second LD's write_result, not the first's.
        let rows = outcome.table.rows();
        assert!(rows[2].exec_start.unwrap() > rows[1].write_result.unwrap());
    }

    /// S4 — CDB contention: an LD (latency 3) issued one cycle before an
    /// independent ADDD (latency 2) starts one cycle later than the LD, so
    /// the two land on the same exec-complete cycle despite never sharing a
    /// unit. The LD's station has the smaller global index (loads occupy
    /// the lowest range) and must win the cycle; the ADDD waits one more.
    #[test]
    fn cdb_contention_resolved_by_global_station_index() {
        let config = Config::default();
        let program = vec![
            ld(0, "F0", 1, 0, &config),
            reg(1, Op::Addd, "F4", "F2", "F6", &config),
        ];
        let mut machine = Machine::new(config);
        let outcome = machine.run(program, None, |_, _| {}).unwrap();
        let rows = outcome.table.rows();
        assert_eq!(rows[0].exec_complete, rows[1].exec_complete);
        assert_eq!(rows[1].write_result, Some(rows[0].write_result.unwrap() + 1));
    }

    /// S5 — structural stall at issue: 4 ADDDs, only 3 add stations.
    #[test]
    fn structural_stall_when_stations_exhausted() {
        let config = Config::default();
        let program = vec![
            reg(0, Op::Addd, "F0", "F2", "F4", &config),
            reg(1, Op::Addd, "F6", "F8", "F10", &config),
            reg(2, Op::Addd, "F12", "F14", "F16", &config),
            reg(3, Op::Addd, "F18", "F20", "F22", &config),
        ];
        let mut machine = Machine::new(config);
        let outcome = machine.run(program, None, |_, _| {}).unwrap();
        let rows = outcome.table.rows();
        assert_eq!(rows[3].issue, rows[0].write_result);
    }

    /// S6 — MULTD's long latency reserves the mult unit for its duration,
    /// blocking a subsequent MULTD from starting even though it can issue.
    #[test]
    fn long_latency_multd_blocks_unit_not_issue() {
        let config = Config::default();
        let program = vec![
            reg(0, Op::Multd, "F0", "F2", "F4", &config),
            reg(1, Op::Multd, "F6", "F8", "F10", &config),
        ];
        let mut machine = Machine::new(config);
        let outcome = machine.run(program, None, |_, _| {}).unwrap();
        let rows = outcome.table.rows();
        assert_eq!(rows[0].issue, Some(1));
        assert_eq!(rows[1].issue, Some(2));
        assert_eq!(rows[0].exec_start, Some(2));
        // Second MULTD cannot start until the unit frees after the first completes.
        assert!(rows[1].exec_start.unwrap() > rows[0].exec_complete.unwrap());
    }

    #[test]
    fn termination_leaves_every_resource_idle() {
        let config = Config::default();
        let program = vec![
            ld(0, "F0", 1, 0, &config),
            reg(1, Op::Addd, "F4", "F0", "F0", &config),
        ];
        let mut machine = Machine::new(config);
        machine.run(program, None, |_, _| {}).unwrap();
        assert!(machine.register_file.all_tags_empty());
        assert!(machine.loads.occupied_indices().is_empty());
        assert!(machine.adds.occupied_indices().is_empty());
        assert!(machine.add_unit.is_available());
    }

    #[test]
    fn interrupt_flag_stops_the_run_early() {
        let config = Config::default();
        let program = vec![
            reg(0, Op::Divd, "F0", "F2", "F4", &config),
            reg(1, Op::Divd, "F6", "F8", "F10", &config),
        ];
        let flag = AtomicBool::new(true);
        let mut machine = Machine::new(config);
        let mut cycles_seen = 0u64;
        let outcome = machine
            .run(program, Some(&flag), |_, cycle| {
                cycles_seen = cycle;
                if cycle == 3 {
                    flag.store(false, Ordering::SeqCst);
                }
            })
            .unwrap();
        assert!(outcome.interrupted);
        assert_eq!(outcome.cycles, cycles_seen);
        assert!(outcome.table.is_incomplete());
    }
}
