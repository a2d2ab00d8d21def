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

// register_file.rs
//
// Maps register name -> (producer tag, committed value). Backed by a
// BTreeMap rather than a HashMap so iteration for the final register dump
// is deterministic (the original source iterates a plain dict, whose
// order is an implementation accident we don't want to inherit).

use std::collections::BTreeMap;

use crate::machine::tag::Tag;

#[derive(Debug, Clone)]
pub struct RegisterFile {
    entries: BTreeMap<String, (Tag, f64)>,
    default_value: f64,
}

impl RegisterFile {
    /// Creates R0..R31 and F0..F31, each holding the empty tag and the
    /// given default value.
    pub fn new(default_value: f64) -> Self {
        let mut entries = BTreeMap::new();
        for i in 0..32 {
            entries.insert(format!("R{}", i), (Tag::empty(), default_value));
            entries.insert(format!("F{}", i), (Tag::empty(), default_value));
        }
        Self { entries, default_value }
    }

    fn entry(&self, name: &str) -> (Tag, f64) {
        self.entries.get(name).copied().unwrap_or((Tag::empty(), self.default_value))
    }

    pub fn read_value(&self, name: &str) -> f64 {
        self.entry(name).1
    }

    pub fn read_tag(&self, name: &str) -> Tag {
        self.entry(name).0
    }

    pub fn set_producer(&mut self, name: &str, tag: Tag) {
        let e = self
            .entries
            .entry(name.to_string())
            .or_insert((Tag::empty(), self.default_value));
        e.0 = tag;
    }

    /// Clears the tag on `name` only if it still equals `matching_tag`,
    /// so a stale producer can never erase a newer renaming.
    pub fn clear_tag(&mut self, name: &str, matching_tag: Tag) {
        if let Some(e) = self.entries.get_mut(name) {
            if e.0 == matching_tag {
                e.0 = Tag::empty();
            }
        }
    }

    pub fn write_value(&mut self, name: &str, value: f64) {
        let e = self
            .entries
            .entry(name.to_string())
            .or_insert((Tag::empty(), self.default_value));
        e.1 = value;
    }

    pub fn all_tags_empty(&self) -> bool {
        self.entries.values().all(|(tag, _)| tag.is_empty())
    }

    /// Name/value pairs in ascending register-name order, for the final
    /// register dump.
    pub fn sorted_values(&self) -> Vec<(String, f64)> {
        self.entries.iter().map(|(name, (_, value))| (name.clone(), *value)).collect()
    }
}
