//! Büchi automaton representation and its validating builder.

use crate::error::{AutomatonError, AutomatonResult};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Handle of a location in a [`BuchiAutomaton`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationId(u32);

impl LocationId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{}", self.0)
    }
}

/// A conjunction of proposition literals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Guard {
    positive: BTreeSet<Arc<str>>,
    negative: BTreeSet<Arc<str>>,
}

impl Guard {
    /// The guard that is always enabled.
    pub fn always() -> Self {
        Self::default()
    }

    /// Add the literal `p`.
    pub fn require(mut self, p: &str) -> Self {
        self.positive.insert(Arc::from(p));
        self
    }

    /// Add the literal `!p`.
    pub fn forbid(mut self, p: &str) -> Self {
        self.negative.insert(Arc::from(p));
        self
    }

    pub fn positive(&self) -> &BTreeSet<Arc<str>> {
        &self.positive
    }

    pub fn negative(&self) -> &BTreeSet<Arc<str>> {
        &self.negative
    }

    pub fn is_always(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }

    /// Whether the guard holds when exactly `satisfied` propositions are true.
    pub fn is_enabled(&self, satisfied: &BTreeSet<Arc<str>>) -> bool {
        self.positive.iter().all(|p| satisfied.contains(p))
            && !self.negative.iter().any(|p| satisfied.contains(p))
    }

    fn contradiction(&self) -> Option<&Arc<str>> {
        self.positive.intersection(&self.negative).next()
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_always() {
            return write!(f, "true");
        }
        let literals: Vec<String> = self
            .positive
            .iter()
            .map(|p| p.to_string())
            .chain(self.negative.iter().map(|p| format!("!{}", p)))
            .collect();
        write!(f, "{}", literals.join(" && "))
    }
}

/// An automaton transition, taken when its guard holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuchiTransition {
    pub guard: Guard,
    pub target: LocationId,
}

impl BuchiTransition {
    #[inline]
    pub fn is_enabled(&self, satisfied: &BTreeSet<Arc<str>>) -> bool {
        self.guard.is_enabled(satisfied)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub name: String,
    pub accepting: bool,
    pub transitions: Vec<BuchiTransition>,
}

/// A Büchi automaton, usually encoding the negation of an LTL property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuchiAutomaton {
    locations: Vec<Location>,
    initial: LocationId,
}

impl BuchiAutomaton {
    pub fn builder() -> AutomatonBuilder {
        AutomatonBuilder::default()
    }

    #[inline]
    pub fn initial_location(&self) -> LocationId {
        self.initial
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    #[inline]
    pub fn location(&self, id: LocationId) -> &Location {
        &self.locations[id.index()]
    }

    #[inline]
    pub fn is_accepting(&self, id: LocationId) -> bool {
        self.locations[id.index()].accepting
    }

    #[inline]
    pub fn out_transitions(&self, id: LocationId) -> &[BuchiTransition] {
        &self.locations[id.index()].transitions
    }

    pub fn find(&self, name: &str) -> Option<LocationId> {
        self.locations
            .iter()
            .position(|l| l.name == name)
            .map(|i| LocationId(i as u32))
    }

    pub fn location_ids(&self) -> impl Iterator<Item = LocationId> {
        (0..self.locations.len()).map(|i| LocationId(i as u32))
    }

    /// Every proposition mentioned by some guard.
    pub fn propositions(&self) -> BTreeSet<Arc<str>> {
        self.locations
            .iter()
            .flat_map(|l| &l.transitions)
            .flat_map(|t| t.guard.positive.iter().chain(t.guard.negative.iter()))
            .cloned()
            .collect()
    }
}

impl fmt::Display for BuchiAutomaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "init {}", self.location(self.initial).name)?;
        for loc in self.locations.iter().filter(|l| l.accepting) {
            writeln!(f, "accept {}", loc.name)?;
        }
        for loc in &self.locations {
            for t in &loc.transitions {
                writeln!(
                    f,
                    "{} -> {} : {}",
                    loc.name,
                    self.location(t.target).name,
                    t.guard
                )?;
            }
        }
        Ok(())
    }
}

/// Incremental construction of a [`BuchiAutomaton`]. Locations are referred
/// to by name; all checks happen in [`AutomatonBuilder::build`].
#[derive(Debug, Default)]
pub struct AutomatonBuilder {
    locations: Vec<(String, bool)>,
    initial: Option<String>,
    transitions: Vec<(String, Guard, String)>,
}

impl AutomatonBuilder {
    pub fn location(&mut self, name: &str, accepting: bool) -> &mut Self {
        self.locations.push((name.to_string(), accepting));
        self
    }

    pub fn initial(&mut self, name: &str) -> &mut Self {
        self.initial = Some(name.to_string());
        self
    }

    pub fn transition(&mut self, from: &str, guard: Guard, to: &str) -> &mut Self {
        self.transitions
            .push((from.to_string(), guard, to.to_string()));
        self
    }

    pub fn build(&self) -> AutomatonResult<BuchiAutomaton> {
        if self.locations.is_empty() {
            return Err(AutomatonError::NoLocations);
        }

        let mut ids: HashMap<&str, LocationId> = HashMap::new();
        let mut locations = Vec::with_capacity(self.locations.len());
        for (name, accepting) in &self.locations {
            let id = LocationId(locations.len() as u32);
            if ids.insert(name.as_str(), id).is_some() {
                return Err(AutomatonError::DuplicateLocation { name: name.clone() });
            }
            locations.push(Location {
                name: name.clone(),
                accepting: *accepting,
                transitions: Vec::new(),
            });
        }

        let resolve = |name: &str| {
            ids.get(name)
                .copied()
                .ok_or_else(|| AutomatonError::UnknownLocation {
                    name: name.to_string(),
                })
        };

        let initial = match &self.initial {
            Some(name) => resolve(name)?,
            None => return Err(AutomatonError::MissingInitial),
        };

        for (from, guard, to) in &self.transitions {
            let source = resolve(from)?;
            let target = resolve(to)?;
            if let Some(p) = guard.contradiction() {
                return Err(AutomatonError::ContradictoryGuard {
                    from: from.clone(),
                    to: to.clone(),
                    proposition: p.to_string(),
                });
            }
            locations[source.index()].transitions.push(BuchiTransition {
                guard: guard.clone(),
                target,
            });
        }

        Ok(BuchiAutomaton { locations, initial })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(names: &[&str]) -> BTreeSet<Arc<str>> {
        names.iter().map(|n| Arc::from(*n)).collect()
    }

    #[test]
    fn test_guard_enabled() {
        let g = Guard::always().require("a").forbid("b");
        assert!(g.is_enabled(&props(&["a"])));
        assert!(g.is_enabled(&props(&["a", "c"])));
        assert!(!g.is_enabled(&props(&["a", "b"])));
        assert!(!g.is_enabled(&props(&[])));
        assert!(Guard::always().is_enabled(&props(&[])));
        assert_eq!(g.to_string(), "a && !b");
        assert_eq!(Guard::always().to_string(), "true");
    }

    #[test]
    fn test_build_simple() {
        let aut = BuchiAutomaton::builder()
            .location("init", false)
            .location("acc", true)
            .initial("init")
            .transition("init", Guard::always(), "init")
            .transition("init", Guard::always().require("bad"), "acc")
            .transition("acc", Guard::always(), "acc")
            .build()
            .unwrap();
        assert_eq!(aut.len(), 2);
        let init = aut.initial_location();
        assert!(!aut.is_accepting(init));
        assert_eq!(aut.out_transitions(init).len(), 2);
        let acc = aut.find("acc").unwrap();
        assert!(aut.is_accepting(acc));
        assert_eq!(aut.propositions(), props(&["bad"]));
    }

    #[test]
    fn test_build_errors() {
        assert_eq!(
            BuchiAutomaton::builder().build(),
            Err(AutomatonError::NoLocations)
        );
        assert_eq!(
            BuchiAutomaton::builder().location("a", false).build(),
            Err(AutomatonError::MissingInitial)
        );
        assert_eq!(
            BuchiAutomaton::builder()
                .location("a", false)
                .location("a", true)
                .initial("a")
                .build(),
            Err(AutomatonError::DuplicateLocation {
                name: "a".to_string()
            })
        );
        assert!(matches!(
            BuchiAutomaton::builder()
                .location("a", false)
                .initial("a")
                .transition("a", Guard::always(), "b")
                .build(),
            Err(AutomatonError::UnknownLocation { .. })
        ));
        assert!(matches!(
            BuchiAutomaton::builder()
                .location("a", false)
                .initial("a")
                .transition("a", Guard::always().require("p").forbid("p"), "a")
                .build(),
            Err(AutomatonError::ContradictoryGuard { .. })
        ));
    }

    #[test]
    fn test_display_lists_every_transition() {
        let aut = BuchiAutomaton::builder()
            .location("s", true)
            .initial("s")
            .transition("s", Guard::always().forbid("done"), "s")
            .build()
            .unwrap();
        assert_eq!(aut.to_string(), "init s\naccept s\ns -> s : !done\n");
    }
}
