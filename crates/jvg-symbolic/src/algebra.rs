use std::fmt::Debug;

use crate::registry::{VarId, VariableRegistry};

/// Abstract symbolic set interface.
///
/// A set is a predicate over every variable of the registry, current and
/// primed copies alike; variables outside its support are unconstrained.
/// `Set` is an owning, move-only handle: implementations must not make it
/// `Clone`, so a second owner can only be obtained through [`share`].
///
/// [`share`]: SymbolicAlgebra::share
pub trait SymbolicAlgebra {
    type Set: Debug;

    /// The variables every set is expressed over.
    fn registry(&self) -> &VariableRegistry;

    fn empty(&self) -> Self::Set;

    fn universe(&self) -> Self::Set;

    /// The set of valuations where `var` takes value index `value`.
    fn literal(&self, var: VarId, value: u32) -> Self::Set;

    /// Add an owner to `set`.
    fn share(&self, set: &Self::Set) -> Self::Set;

    fn and(&self, a: &Self::Set, b: &Self::Set) -> Self::Set;

    fn or(&self, a: &Self::Set, b: &Self::Set) -> Self::Set;

    fn not(&self, a: &Self::Set) -> Self::Set;

    fn exists(&self, set: &Self::Set, vars: &[VarId]) -> Self::Set;

    /// Swap every current variable with its primed twin.
    fn prime(&self, set: &Self::Set) -> Self::Set;

    fn is_empty(&self, set: &Self::Set) -> bool;

    fn equals(&self, a: &Self::Set, b: &Self::Set) -> bool;

    /// Value indices of one satisfying valuation of `set`, projected on `vars`.
    fn sat_one_values(&self, set: &Self::Set, vars: &[VarId]) -> Option<Vec<u32>>;

    /// Number of valuations of `vars` that extend to a member of `set`.
    fn count(&self, set: &Self::Set, vars: &[VarId]) -> u64;

    /// Inverse of [`prime`](SymbolicAlgebra::prime).
    fn unprime(&self, set: &Self::Set) -> Self::Set {
        self.prime(set)
    }

    fn and_not(&self, a: &Self::Set, b: &Self::Set) -> Self::Set {
        self.and(a, &self.not(b))
    }

    /// `a -> b`
    fn implies(&self, a: &Self::Set, b: &Self::Set) -> Self::Set {
        self.or(&self.not(a), b)
    }

    fn forall(&self, set: &Self::Set, vars: &[VarId]) -> Self::Set {
        self.not(&self.exists(&self.not(set), vars))
    }

    fn is_subset(&self, a: &Self::Set, b: &Self::Set) -> bool {
        self.is_empty(&self.and_not(a, b))
    }

    fn intersects(&self, a: &Self::Set, b: &Self::Set) -> bool {
        !self.is_empty(&self.and(a, b))
    }

    /// Successor image: next states reachable from `set` through `trans`,
    /// expressed over current variables.
    fn succ(&self, set: &Self::Set, trans: &Self::Set) -> Self::Set {
        let current = self.registry().current_vars();
        self.unprime(&self.exists(&self.and(set, trans), &current))
    }

    /// Pre-image: current states with a `trans` step into `set`.
    fn pred(&self, trans: &Self::Set, set: &Self::Set) -> Self::Set {
        let primed = self.registry().primed_vars();
        self.exists(&self.and(trans, &self.prime(set)), &primed)
    }

    /// Conjunction of literals fixing each of `vars` to the given value.
    fn cube(&self, assignment: &[(VarId, u32)]) -> Self::Set {
        let mut acc = self.universe();
        for (var, value) in assignment {
            acc = self.and(&acc, &self.literal(*var, *value));
        }
        acc
    }

    /// A cube over `vars` fixing one satisfying assignment of `set`.
    fn sat_one(&self, set: &Self::Set, vars: &[VarId]) -> Option<Self::Set> {
        let values = self.sat_one_values(set, vars)?;
        let assignment: Vec<(VarId, u32)> = vars.iter().copied().zip(values).collect();
        Some(self.cube(&assignment))
    }

    /// Variables whose value affects membership in `set`.
    fn support(&self, set: &Self::Set) -> Vec<VarId> {
        self.registry()
            .ids()
            .filter(|var| !self.equals(&self.exists(set, &[*var]), set))
            .collect()
    }

    fn or_all<'a, I>(&self, sets: I) -> Self::Set
    where
        I: IntoIterator<Item = &'a Self::Set>,
        Self::Set: 'a,
    {
        let mut acc = self.empty();
        for set in sets {
            acc = self.or(&acc, set);
        }
        acc
    }

    /// Every valuation of `vars` that extends to a member of `set`, in
    /// backend order, stopping after `limit` entries.
    fn enumerate(&self, set: &Self::Set, vars: &[VarId], limit: usize) -> Vec<Vec<u32>> {
        let mut rest = self.share(set);
        let mut out = Vec::new();
        while out.len() < limit {
            let Some(values) = self.sat_one_values(&rest, vars) else {
                break;
            };
            let assignment: Vec<(VarId, u32)> =
                vars.iter().copied().zip(values.iter().copied()).collect();
            rest = self.and_not(&rest, &self.cube(&assignment));
            out.push(values);
        }
        out
    }
}
