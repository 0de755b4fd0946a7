//! Item sources: what gets injected at the head of the belt each timeslot.

use crate::id::PartId;
use crate::item::Item;
use crate::rng::{RandomSource, SimRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Errors building an item source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("invalid configuration: item source has no possible outcomes")]
    NoOutcomes,
}

/// Produces zero or one item per call. Called once per timeslot.
pub trait ItemSource {
    fn next_item(&mut self) -> Option<Item>;

    /// Draw `quantity` consecutive outcomes.
    fn next_items(&mut self, quantity: usize) -> Vec<Option<Item>> {
        (0..quantity).map(|_| self.next_item()).collect()
    }
}

impl<S: ItemSource + ?Sized> ItemSource for &mut S {
    fn next_item(&mut self) -> Option<Item> {
        (**self).next_item()
    }
}

// ---------------------------------------------------------------------------
// Uniform source
// ---------------------------------------------------------------------------

/// Picks uniformly among `parts`, plus one "nothing" outcome when
/// `empty_possible` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniformSource {
    parts: Vec<PartId>,
    empty_possible: bool,
    rng: SimRng,
}

impl UniformSource {
    pub fn new(parts: Vec<PartId>, empty_possible: bool, rng: SimRng) -> Result<Self, SourceError> {
        if parts.is_empty() && !empty_possible {
            return Err(SourceError::NoOutcomes);
        }
        Ok(Self { parts, empty_possible, rng })
    }

    pub fn parts(&self) -> &[PartId] {
        &self.parts
    }

    pub fn empty_possible(&self) -> bool {
        self.empty_possible
    }

    /// Number of equally likely outcomes per draw.
    pub fn outcomes(&self) -> usize {
        self.parts.len() + usize::from(self.empty_possible)
    }

    pub fn rng(&self) -> &SimRng {
        &self.rng
    }
}

impl ItemSource for UniformSource {
    fn next_item(&mut self) -> Option<Item> {
        let idx = self.rng.next_below(self.outcomes() as u64) as usize;
        // The index one past the last part is the empty outcome.
        self.parts.get(idx).map(|&part| Item::new(part))
    }
}

// ---------------------------------------------------------------------------
// Scripted source
// ---------------------------------------------------------------------------

/// Replays a fixed sequence of outcomes, then yields nothing forever.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedSource {
    script: VecDeque<Option<PartId>>,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = Option<PartId>>) -> Self {
        Self { script: script.into_iter().collect() }
    }

    /// Outcomes still to be replayed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl ItemSource for ScriptedSource {
    fn next_item(&mut self) -> Option<Item> {
        self.script.pop_front().flatten().map(Item::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: PartId = PartId::from_char('A');
    const B: PartId = PartId::from_char('B');

    #[test]
    fn no_outcomes_rejected() {
        assert_eq!(
            UniformSource::new(vec![], false, SimRng::new(0)).unwrap_err(),
            SourceError::NoOutcomes
        );
    }

    #[test]
    fn empty_only_source_never_produces() {
        let mut source = UniformSource::new(vec![], true, SimRng::new(3)).unwrap();
        assert!(source.next_items(50).iter().all(Option::is_none));
    }

    #[test]
    fn single_part_without_empty_always_produces() {
        let mut source = UniformSource::new(vec![A], false, SimRng::new(3)).unwrap();
        for item in source.next_items(50) {
            assert_eq!(item, Some(Item::new(A)));
        }
    }

    #[test]
    fn uniform_source_hits_every_outcome() {
        let mut source = UniformSource::new(vec![A, B], true, SimRng::new(99)).unwrap();
        assert_eq!(source.outcomes(), 3);
        let draws = source.next_items(3000);
        let a = draws.iter().filter(|d| d.as_ref().map(Item::part) == Some(A)).count();
        let b = draws.iter().filter(|d| d.as_ref().map(Item::part) == Some(B)).count();
        let none = draws.iter().filter(|d| d.is_none()).count();
        for count in [a, b, none] {
            assert!((700..=1300).contains(&count), "skewed draws: a={a} b={b} none={none}");
        }
    }

    #[test]
    fn same_seed_same_stream() {
        let mut s1 = UniformSource::new(vec![A, B], true, SimRng::new(5)).unwrap();
        let mut s2 = UniformSource::new(vec![A, B], true, SimRng::new(5)).unwrap();
        assert_eq!(s1.next_items(100), s2.next_items(100));
    }

    #[test]
    fn scripted_source_replays_then_runs_dry() {
        let mut source = ScriptedSource::new([Some(A), None, Some(B)]);
        assert_eq!(source.remaining(), 3);
        assert_eq!(source.next_item(), Some(Item::new(A)));
        assert_eq!(source.next_item(), None);
        assert_eq!(source.next_item(), Some(Item::new(B)));
        assert_eq!(source.next_items(3), vec![None, None, None]);
    }
}
