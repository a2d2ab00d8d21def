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

// config.rs
//
// Tunable parameters for a Tomasulo machine: reservation-station counts,
// per-opcode latencies, and the default register value. A `Machine` borrows
// one `Config` at construction time instead of reading module-scope
// constants, so independent simulations never share mutable state.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub num_load_stations: usize,
    pub num_store_stations: usize,
    pub num_add_stations: usize,
    pub num_mult_stations: usize,

    pub load_latency: u32,
    pub store_latency: u32,
    pub add_latency: u32,
    pub sub_latency: u32,
    pub mult_latency: u32,
    pub div_latency: u32,

    pub default_register_value: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_load_stations: 3,
            num_store_stations: 3,
            num_add_stations: 3,
            num_mult_stations: 2,

            load_latency: 3,
            store_latency: 3,
            add_latency: 2,
            sub_latency: 2,
            mult_latency: 10,
            div_latency: 40,

            default_register_value: 2.0,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_station_counts(mut self, load: usize, store: usize, add: usize, mult: usize) -> Self {
        self.num_load_stations = load;
        self.num_store_stations = store;
        self.num_add_stations = add;
        self.num_mult_stations = mult;
        self
    }

    pub fn with_latencies(mut self, load: u32, store: u32, add: u32, sub: u32, mult: u32, div: u32) -> Self {
        self.load_latency = load;
        self.store_latency = store;
        self.add_latency = add;
        self.sub_latency = sub;
        self.mult_latency = mult;
        self.div_latency = div;
        self
    }

    pub fn with_default_register_value(mut self, value: f64) -> Self {
        self.default_register_value = value;
        self
    }

    pub fn total_stations(&self) -> usize {
        self.num_load_stations + self.num_store_stations + self.num_add_stations + self.num_mult_stations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_normative_values() {
        let cfg = Config::default();
        assert_eq!(cfg.num_load_stations, 3);
        assert_eq!(cfg.num_store_stations, 3);
        assert_eq!(cfg.num_add_stations, 3);
        assert_eq!(cfg.num_mult_stations, 2);
        assert_eq!(cfg.load_latency, 3);
        assert_eq!(cfg.add_latency, 2);
        assert_eq!(cfg.mult_latency, 10);
        assert_eq!(cfg.div_latency, 40);
        assert_eq!(cfg.default_register_value, 2.0);
    }

    #[test]
    fn builder_overrides_apply() {
        let cfg = Config::new()
            .with_station_counts(1, 1, 1, 1)
            .with_latencies(1, 1, 1, 1, 1, 1)
            .with_default_register_value(0.0);
        assert_eq!(cfg.total_stations(), 4);
        assert_eq!(cfg.mult_latency, 1);
        assert_eq!(cfg.default_register_value, 0.0);
    }
}
