use roaring::RoaringBitmap;
use std::rc::Rc;

use crate::algebra::SymbolicAlgebra;
use crate::error::SymbolicError;
use crate::registry::{VarId, VariableRegistry};

/// Largest index space the explicit backend accepts.
pub const EXPLICIT_UNIVERSE_LIMIT: u64 = u32::MAX as u64;

/// Set handle of the explicit backend.
///
/// Holds one owner of a shared, immutable bitmap. Not `Clone`: extra owners
/// come from [`SymbolicAlgebra::share`], and dropping the handle releases it.
#[derive(Debug)]
pub struct ExplicitSet {
    bits: Rc<RoaringBitmap>,
}

impl ExplicitSet {
    fn new(bits: RoaringBitmap) -> Self {
        Self { bits: Rc::new(bits) }
    }

    /// Number of owners currently sharing this set's storage.
    pub fn owners(&self) -> usize {
        Rc::strong_count(&self.bits)
    }
}

/// Enumerative backend: each set is the bitmap of the mixed-radix indices
/// of its member valuations over all registry variables.
#[derive(Debug)]
pub struct ExplicitAlgebra {
    registry: VariableRegistry,
    strides: Vec<u64>,
    sizes: Vec<u64>,
    universe_size: u64,
    universe: Rc<RoaringBitmap>,
    twins: Vec<(VarId, VarId)>,
}

impl ExplicitAlgebra {
    pub fn new(registry: VariableRegistry) -> Result<Self, SymbolicError> {
        let mut strides = Vec::with_capacity(registry.len());
        let mut sizes = Vec::with_capacity(registry.len());
        let mut total: u128 = 1;
        for id in registry.ids() {
            strides.push(total as u64);
            let size = u64::from(registry.domain_size(id));
            sizes.push(size);
            total *= u128::from(size);
            if total > u128::from(EXPLICIT_UNIVERSE_LIMIT) {
                return Err(SymbolicError::UniverseTooLarge {
                    size: total,
                    limit: EXPLICIT_UNIVERSE_LIMIT,
                });
            }
        }
        let universe_size = total as u64;
        let mut universe = RoaringBitmap::new();
        universe.insert_range(0..universe_size as u32);
        let twins = registry
            .current_vars()
            .into_iter()
            .map(|current| (current, current.twin()))
            .collect();
        Ok(Self {
            twins,
            registry,
            strides,
            sizes,
            universe_size,
            universe: Rc::new(universe),
        })
    }

    /// Size of the index space (all variables, primed twins included).
    pub fn universe_size(&self) -> u64 {
        self.universe_size
    }

    fn value_of(&self, index: u32, var: VarId) -> u64 {
        let v = var.index();
        (u64::from(index) / self.strides[v]) % self.sizes[v]
    }

    fn swap_twins(&self, index: u32) -> u32 {
        let mut out = i64::from(index);
        for &(current, primed) in &self.twins {
            let vc = self.value_of(index, current) as i64;
            let vp = self.value_of(index, primed) as i64;
            let sc = self.strides[current.index()] as i64;
            let sp = self.strides[primed.index()] as i64;
            out += (vp - vc) * sc + (vc - vp) * sp;
        }
        out as u32
    }

    fn exists_one(&self, bits: &RoaringBitmap, var: VarId) -> RoaringBitmap {
        let stride = self.strides[var.index()];
        let size = self.sizes[var.index()];
        let mut out = RoaringBitmap::new();
        for index in bits.iter() {
            let base = u64::from(index) - self.value_of(index, var) * stride;
            for value in 0..size {
                out.insert((base + value * stride) as u32);
            }
        }
        out
    }
}

impl SymbolicAlgebra for ExplicitAlgebra {
    type Set = ExplicitSet;

    fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    fn empty(&self) -> ExplicitSet {
        ExplicitSet::new(RoaringBitmap::new())
    }

    fn universe(&self) -> ExplicitSet {
        ExplicitSet {
            bits: Rc::clone(&self.universe),
        }
    }

    fn literal(&self, var: VarId, value: u32) -> ExplicitSet {
        let stride = self.strides[var.index()];
        let size = self.sizes[var.index()];
        let mut bits = RoaringBitmap::new();
        if u64::from(value) < size {
            let block = stride * size;
            let mut base = 0;
            while base < self.universe_size {
                let start = base + u64::from(value) * stride;
                bits.insert_range(start as u32..(start + stride) as u32);
                base += block;
            }
        }
        ExplicitSet::new(bits)
    }

    fn share(&self, set: &ExplicitSet) -> ExplicitSet {
        ExplicitSet {
            bits: Rc::clone(&set.bits),
        }
    }

    fn and(&self, a: &ExplicitSet, b: &ExplicitSet) -> ExplicitSet {
        ExplicitSet::new(a.bits.as_ref() & b.bits.as_ref())
    }

    fn or(&self, a: &ExplicitSet, b: &ExplicitSet) -> ExplicitSet {
        ExplicitSet::new(a.bits.as_ref() | b.bits.as_ref())
    }

    fn not(&self, a: &ExplicitSet) -> ExplicitSet {
        ExplicitSet::new(self.universe.as_ref() - a.bits.as_ref())
    }

    fn and_not(&self, a: &ExplicitSet, b: &ExplicitSet) -> ExplicitSet {
        ExplicitSet::new(a.bits.as_ref() - b.bits.as_ref())
    }

    fn exists(&self, set: &ExplicitSet, vars: &[VarId]) -> ExplicitSet {
        let mut bits = (*set.bits).clone();
        for var in vars {
            if bits.is_empty() {
                break;
            }
            bits = self.exists_one(&bits, *var);
        }
        ExplicitSet::new(bits)
    }

    fn prime(&self, set: &ExplicitSet) -> ExplicitSet {
        let bits: RoaringBitmap = set.bits.iter().map(|i| self.swap_twins(i)).collect();
        ExplicitSet::new(bits)
    }

    fn is_empty(&self, set: &ExplicitSet) -> bool {
        set.bits.is_empty()
    }

    fn equals(&self, a: &ExplicitSet, b: &ExplicitSet) -> bool {
        Rc::ptr_eq(&a.bits, &b.bits) || a.bits == b.bits
    }

    fn is_subset(&self, a: &ExplicitSet, b: &ExplicitSet) -> bool {
        a.bits.is_subset(&b.bits)
    }

    fn sat_one_values(&self, set: &ExplicitSet, vars: &[VarId]) -> Option<Vec<u32>> {
        let index = set.bits.min()?;
        Some(
            vars.iter()
                .map(|var| self.value_of(index, *var) as u32)
                .collect(),
        )
    }

    fn count(&self, set: &ExplicitSet, vars: &[VarId]) -> u64 {
        let others: Vec<VarId> = self
            .registry
            .ids()
            .filter(|id| !vars.contains(id))
            .collect();
        let projected = self.exists(set, &others);
        let spread: u64 = others.iter().map(|id| self.sizes[id.index()]).product();
        projected.bits.len() / spread
    }
}
