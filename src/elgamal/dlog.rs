//! Bounded discrete logarithm in base `g`.
use std::collections::HashMap;

use num_bigint::BigUint;
use num_traits::One;

use super::{DLOG_BOUND, GroupParams};

const BABY_STEPS: u64 = 1 << 10;
const GIANT_STEPS: u64 = DLOG_BOUND.div_ceil(BABY_STEPS);

/// Baby-step giant-step table for exponents in `[0, DLOG_BOUND)`.
///
/// Answers exactly what a linear scan `g^0, g^1, ...` up to [`DLOG_BOUND`]
/// answers. The subgroup order is far larger than the bound, so the
/// exponent found is unique.
#[derive(Clone)]
pub(crate) struct DlogTable {
    baby: HashMap<BigUint, u64>,
    giant: BigUint,
    p: BigUint,
}

impl DlogTable {
    pub(crate) fn new(params: &GroupParams) -> Self {
        let mut baby = HashMap::with_capacity(BABY_STEPS as usize);
        let mut a = BigUint::one();
        for j in 0..BABY_STEPS {
            baby.entry(a.clone()).or_insert(j);
            a = a * &params.g % &params.p;
        }
        // a = g^BABY_STEPS
        Self {
            baby,
            giant: params.invert(&a),
            p: params.p.clone(),
        }
    }

    /// Finds `m < DLOG_BOUND` with `g^m = target`.
    pub(crate) fn find(&self, target: &BigUint) -> Option<u64> {
        let mut gamma = target.clone();
        for i in 0..GIANT_STEPS {
            if let Some(j) = self.baby.get(&gamma) {
                let m = i * BABY_STEPS + j;
                return (m < DLOG_BOUND).then_some(m);
            }
            gamma = gamma * &self.giant % &self.p;
        }
        None
    }
}
