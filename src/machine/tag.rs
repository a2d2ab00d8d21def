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

// tag.rs
//
// A Tag identifies a pending producer: a reservation-station class plus
// that pool's local station index, or the distinguished empty tag meaning
// "the operand is a real, committed value". Tags are value types copied
// by stations at operand-capture time; clearing a register's live tag
// later must never retroactively mutate a tag a station already holds.

use std::fmt;

use crate::instruction::StationClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tag {
    class: Option<StationClass>,
    index: usize,
}

impl Tag {
    pub fn new(class: StationClass, index: usize) -> Self {
        Self { class: Some(class), index }
    }

    pub fn empty() -> Self {
        Self { class: None, index: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.class.is_none()
    }

    pub fn class(&self) -> Option<StationClass> {
        self.class
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn clear(&mut self) {
        *self = Tag::empty();
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            None => write!(f, "-"),
            Some(class) => write!(f, "{:?}[{}]", class, self.index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tag_is_distinct_and_equal_to_itself() {
        assert!(Tag::empty().is_empty());
        assert_eq!(Tag::empty(), Tag::empty());
    }

    #[test]
    fn tags_compare_structurally() {
        let a = Tag::new(StationClass::Add, 1);
        let b = Tag::new(StationClass::Add, 1);
        let c = Tag::new(StationClass::Add, 2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn clear_resets_to_empty_without_affecting_prior_copies() {
        let mut t = Tag::new(StationClass::Mult, 0);
        let captured = t;
        t.clear();
        assert!(t.is_empty());
        assert!(!captured.is_empty());
    }
}
