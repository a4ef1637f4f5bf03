//! Watch expressions: live read-only views of the accumulator or a cell.

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use crate::debug::{ExprError, Probe};

/// A watched location with an optional display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watch {
    pub probe: Probe,
    pub label: Option<String>,
}

impl Watch {
    pub fn new(probe: Probe) -> Self {
        Self { probe, label: None }
    }

    pub fn labeled(probe: Probe, label: impl Into<String>) -> Self {
        Self { probe, label: Some(label.into()) }
    }

    /// The label, or the probe's own name.
    pub fn name(&self) -> String {
        self.label.clone().unwrap_or_else(|| self.probe.to_string())
    }

    pub fn evaluate(&self, acc: i64, memory: &[i64]) -> WatchValue {
        WatchValue {
            name: self.name(),
            value: self.probe.read(acc, memory),
        }
    }
}

impl FromStr for Watch {
    type Err = ExprError;

    /// `acc`, `mem[3]`, `mem[3] as counter`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(" as ") {
            Some((probe, label)) => Ok(Watch::labeled(probe.parse()?, label.trim())),
            None => Ok(Watch::new(s.parse()?)),
        }
    }
}

/// A freshly computed watch. `None` means the location is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchValue {
    pub name: String,
    pub value: Option<i64>,
}

impl fmt::Display for WatchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(v) => write!(f, "{} = {}", self.name, v),
            None => write!(f, "{} = unavailable", self.name),
        }
    }
}

/// Ordered watch list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Watches {
    items: Vec<Watch>,
}

impl Watches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, watch: Watch) {
        self.items.push(watch);
    }

    pub fn remove(&mut self, index: usize) -> Option<Watch> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Watch> {
        self.items.iter()
    }

    /// Recompute every watch against the given state.
    pub fn evaluate(&self, acc: i64, memory: &[i64]) -> Vec<WatchValue> {
        self.items.iter().map(|w| w.evaluate(acc, memory)).collect()
    }
}
