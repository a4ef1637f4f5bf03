//! Address and conditional breakpoints.
//!
//! Address breakpoints are checked before an instruction is fetched, so the
//! instruction at the breakpoint has not run yet when the machine pauses.
//! Conditional breakpoints are checked after an instruction completes.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use crate::debug::{Comparison, ExprError, Probe};
use crate::debug::probe::parse_value;

/// Pause when `probe <op> value` holds after a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalBreakpoint {
    pub probe: Probe,
    pub op: Comparison,
    pub value: i64,
}

impl ConditionalBreakpoint {
    pub fn new(probe: Probe, op: Comparison, value: i64) -> Self {
        Self { probe, op, value }
    }

    /// A memory condition on a cell outside memory never holds.
    pub fn holds(&self, acc: i64, memory: &[i64]) -> bool {
        self.probe
            .read(acc, memory)
            .is_some_and(|current| self.op.holds(current, self.value))
    }
}

impl fmt::Display for ConditionalBreakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.probe, self.op, self.value)
    }
}

impl FromStr for ConditionalBreakpoint {
    type Err = ExprError;

    /// `acc >= 10`, `mem[4] == 0t+-`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (op, at) = Comparison::ALL
            .into_iter()
            .find_map(|op| s.find(op.symbol()).map(|at| (op, at)))
            .ok_or_else(|| ExprError::MissingOperator(s.trim().to_string()))?;

        let probe = s[..at].parse::<Probe>()?;
        let value = parse_value(&s[at + op.symbol().len()..])?;
        Ok(Self { probe, op, value })
    }
}

/// The breakpoint set: address breakpoints plus an ordered condition list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Breakpoints {
    addresses: BTreeSet<usize>,
    conditions: Vec<ConditionalBreakpoint>,
}

impl Breakpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the address already had a breakpoint.
    pub fn add(&mut self, addr: usize) -> bool {
        self.addresses.insert(addr)
    }

    pub fn remove(&mut self, addr: usize) -> bool {
        self.addresses.remove(&addr)
    }

    /// Flip the breakpoint at `addr`. Returns whether it is now set.
    pub fn toggle(&mut self, addr: usize) -> bool {
        if self.addresses.remove(&addr) {
            false
        } else {
            self.addresses.insert(addr);
            true
        }
    }

    #[inline]
    pub fn contains(&self, addr: usize) -> bool {
        self.addresses.contains(&addr)
    }

    /// Breakpoint addresses in ascending order.
    pub fn addresses(&self) -> impl Iterator<Item = usize> + '_ {
        self.addresses.iter().copied()
    }

    pub fn add_condition(&mut self, condition: ConditionalBreakpoint) {
        self.conditions.push(condition);
    }

    pub fn remove_condition(&mut self, index: usize) -> Option<ConditionalBreakpoint> {
        (index < self.conditions.len()).then(|| self.conditions.remove(index))
    }

    pub fn conditions(&self) -> &[ConditionalBreakpoint] {
        &self.conditions
    }

    /// The first condition, in insertion order, that holds.
    pub fn first_hit(&self, acc: i64, memory: &[i64]) -> Option<&ConditionalBreakpoint> {
        self.conditions.iter().find(|c| c.holds(acc, memory))
    }

    /// Remove every address breakpoint and condition.
    pub fn clear(&mut self) {
        self.addresses.clear();
        self.conditions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let mut bps = Breakpoints::new();
        assert!(bps.toggle(4));
        assert!(bps.contains(4));
        assert!(!bps.toggle(4));
        assert!(!bps.contains(4));
    }

    #[test]
    fn test_no_duplicates() {
        let mut bps = Breakpoints::new();
        assert!(bps.add(9));
        assert!(!bps.add(9));
        bps.add(2);
        assert_eq!(bps.addresses().collect::<Vec<_>>(), vec![2, 9]);
    }

    #[test]
    fn test_parse_condition() {
        let c: ConditionalBreakpoint = "acc >= 5".parse().unwrap();
        assert_eq!(c, ConditionalBreakpoint::new(Probe::Accumulator, Comparison::Ge, 5));
        assert_eq!(c.to_string(), "ACC >= 5");

        let c: ConditionalBreakpoint = "mem[3]!=-2".parse().unwrap();
        assert_eq!(c, ConditionalBreakpoint::new(Probe::Memory(3), Comparison::Ne, -2));

        let c: ConditionalBreakpoint = "acc < 0t-".parse().unwrap();
        assert_eq!(c.value, -1);
        assert_eq!(c.op, Comparison::Lt);

        assert!(matches!("acc 5".parse::<ConditionalBreakpoint>(), Err(ExprError::MissingOperator(_))));
    }

    #[test]
    fn test_first_hit_in_order() {
        let mut bps = Breakpoints::new();
        bps.add_condition("mem[0] == 1".parse().unwrap());
        bps.add_condition("acc > 2".parse().unwrap());
        bps.add_condition("acc > 1".parse().unwrap());

        let memory = [0, 0];
        assert_eq!(bps.first_hit(1, &memory), None);
        assert_eq!(bps.first_hit(3, &memory).unwrap().to_string(), "ACC > 2");
        assert_eq!(bps.first_hit(3, &[1]).unwrap().to_string(), "MEM[0] == 1");
    }

    #[test]
    fn test_out_of_range_condition_never_holds() {
        let c = ConditionalBreakpoint::new(Probe::Memory(50), Comparison::Eq, 0);
        assert!(!c.holds(0, &[0; 27]));
    }

    #[test]
    fn test_remove_condition() {
        let mut bps = Breakpoints::new();
        bps.add_condition("acc == 1".parse().unwrap());
        assert!(bps.remove_condition(3).is_none());
        assert!(bps.remove_condition(0).is_some());
        assert!(bps.conditions().is_empty());
    }
}
