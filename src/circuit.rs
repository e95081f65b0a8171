//! Boolean circuits of 2-input gates and their direct (plaintext) evaluation.
//!
//! A [`Circuit`] is a DAG of named [`Gate`]s plus a list of output gates. The
//! graph is validated once, on construction: every referenced gate must exist
//! and there must be no cycles. Evaluation then resolves the outputs depth
//! first, computing every shared sub-circuit only once.
use std::{
    collections::{HashMap, HashSet},
    fmt,
    hash::Hash,
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building or evaluating a circuit.
///
/// Gate ids are rendered with their `Debug` representation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CircuitError {
    /// The gate kind is not one of `INPUT`, `AND`, `NAND`, `OR`, `NOR`, `XOR`.
    #[error("unknown gate kind {0:?}")]
    UnknownKind(String),
    /// An `INPUT` gate was given inputs, or a logic gate lacks one.
    #[error("{kind} gate with the wrong number of inputs")]
    BadArity {
        /// The offending gate kind.
        kind: String,
    },
    /// The same gate id was defined twice.
    #[error("gate {0} is defined twice")]
    DuplicateGate(String),
    /// A gate or output refers to an undefined gate.
    #[error("gate {0} is not defined")]
    UnknownGate(String),
    /// The gate graph contains a cycle through this gate.
    #[error("gate {0} depends on itself")]
    Cycle(String),
    /// No value was provided for an input gate that an output depends on.
    #[error("no value for input gate {0}")]
    MissingInput(String),
    /// A value was provided for a gate that is not an input gate.
    #[error("gate {0} is not an input gate")]
    NotAnInputGate(String),
}

/// The boolean function computed by a logic gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    /// `a & b`
    And,
    /// `!(a & b)`
    Nand,
    /// `a | b`
    Or,
    /// `!(a | b)`
    Nor,
    /// `a ^ b`
    Xor,
}

impl Op {
    /// All operations.
    pub const ALL: [Op; 5] = [Op::And, Op::Nand, Op::Or, Op::Nor, Op::Xor];

    /// Applies the boolean function.
    pub fn compute(self, a: bool, b: bool) -> bool {
        match self {
            Op::And => a & b,
            Op::Nand => !(a & b),
            Op::Or => a | b,
            Op::Nor => !(a | b),
            Op::Xor => a ^ b,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Op::And => "AND",
            Op::Nand => "NAND",
            Op::Or => "OR",
            Op::Nor => "NOR",
            Op::Xor => "XOR",
        })
    }
}

impl FromStr for Op {
    type Err = CircuitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Op::ALL
            .into_iter()
            .find(|op| op.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| CircuitError::UnknownKind(s.to_string()))
    }
}

/// A gate, identified within its circuit by an id of type `Id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gate<Id> {
    /// A wire whose value is provided by one of the parties.
    Input,
    /// A 2-input logic gate.
    Logic {
        /// The boolean function.
        op: Op,
        /// The first input.
        in0: Id,
        /// The second input.
        in1: Id,
    },
}

impl<Id> Gate<Id> {
    /// A logic gate computing `op(in0, in1)`.
    pub fn logic(op: Op, in0: Id, in1: Id) -> Self {
        Gate::Logic { op, in0, in1 }
    }

    /// `in0 & in1`
    pub fn and(in0: Id, in1: Id) -> Self {
        Self::logic(Op::And, in0, in1)
    }

    /// `!(in0 & in1)`
    pub fn nand(in0: Id, in1: Id) -> Self {
        Self::logic(Op::Nand, in0, in1)
    }

    /// `in0 | in1`
    pub fn or(in0: Id, in1: Id) -> Self {
        Self::logic(Op::Or, in0, in1)
    }

    /// `!(in0 | in1)`
    pub fn nor(in0: Id, in1: Id) -> Self {
        Self::logic(Op::Nor, in0, in1)
    }

    /// `in0 ^ in1`
    pub fn xor(in0: Id, in1: Id) -> Self {
        Self::logic(Op::Xor, in0, in1)
    }

    /// Builds a gate from its textual description `(kind, in0, in1)`.
    ///
    /// `INPUT` gates take no inputs, all other kinds take exactly two. Kinds
    /// are matched case-insensitively.
    pub fn from_description(
        kind: &str,
        in0: Option<Id>,
        in1: Option<Id>,
    ) -> Result<Self, CircuitError> {
        if kind.eq_ignore_ascii_case("INPUT") {
            return match (in0, in1) {
                (None, None) => Ok(Gate::Input),
                _ => Err(CircuitError::BadArity {
                    kind: "INPUT".to_string(),
                }),
            };
        }
        let op: Op = kind.parse()?;
        match (in0, in1) {
            (Some(in0), Some(in1)) => Ok(Self::logic(op, in0, in1)),
            _ => Err(CircuitError::BadArity {
                kind: op.to_string(),
            }),
        }
    }

    /// Whether this is an [`Gate::Input`].
    pub fn is_input(&self) -> bool {
        matches!(self, Gate::Input)
    }

    /// The two inputs of a logic gate.
    pub fn inputs(&self) -> Option<(&Id, &Id)> {
        match self {
            Gate::Input => None,
            Gate::Logic { in0, in1, .. } => Some((in0, in1)),
        }
    }
}

/// A validated, acyclic boolean circuit.
#[derive(Debug, Clone)]
pub struct Circuit<Id> {
    gates: HashMap<Id, Gate<Id>>,
    outputs: Vec<Id>,
    output_set: HashSet<Id>,
    order: Vec<Id>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Active,
    Done,
}

impl<Id: Eq + Hash + Clone + fmt::Debug> Circuit<Id> {
    /// Builds a circuit from its gates and output gate ids.
    ///
    /// Fails if a gate id is defined twice, if a gate input or an output
    /// refers to an undefined gate, or if the gates form a cycle. Duplicate
    /// output ids are ignored.
    pub fn new(
        gates: impl IntoIterator<Item = (Id, Gate<Id>)>,
        outputs: impl IntoIterator<Item = Id>,
    ) -> Result<Self, CircuitError> {
        let mut ids = vec![];
        let mut map = HashMap::new();
        for (id, gate) in gates {
            if map.contains_key(&id) {
                return Err(CircuitError::DuplicateGate(format!("{id:?}")));
            }
            ids.push(id.clone());
            map.insert(id, gate);
        }
        for gate in map.values() {
            if let Some((in0, in1)) = gate.inputs() {
                for id in [in0, in1] {
                    if !map.contains_key(id) {
                        return Err(CircuitError::UnknownGate(format!("{id:?}")));
                    }
                }
            }
        }
        let mut output_set = HashSet::new();
        let mut unique_outputs = vec![];
        for id in outputs {
            if !map.contains_key(&id) {
                return Err(CircuitError::UnknownGate(format!("{id:?}")));
            }
            if output_set.insert(id.clone()) {
                unique_outputs.push(id);
            }
        }
        let order = topological_sort(&map, &ids)?;
        Ok(Self {
            gates: map,
            outputs: unique_outputs,
            output_set,
            order,
        })
    }

    /// The gate with the given id.
    pub fn gate(&self, id: &Id) -> Option<&Gate<Id>> {
        self.gates.get(id)
    }

    /// All gates, in topological order.
    pub fn gates(&self) -> impl Iterator<Item = (&Id, &Gate<Id>)> {
        self.order.iter().filter_map(|id| self.gates.get_key_value(id))
    }

    /// Ids of all input gates, in topological order.
    pub fn input_gates(&self) -> impl Iterator<Item = &Id> {
        self.gates()
            .filter(|(_, gate)| gate.is_input())
            .map(|(id, _)| id)
    }

    /// The output gate ids.
    pub fn outputs(&self) -> &[Id] {
        &self.outputs
    }

    /// Whether `id` is an output gate.
    pub fn is_output(&self, id: &Id) -> bool {
        self.output_set.contains(id)
    }

    /// Gate ids ordered so that every gate comes after both of its inputs.
    pub fn topological_order(&self) -> &[Id] {
        &self.order
    }

    /// Number of gates.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Whether the circuit has no gates.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Checks that all `ids` are input gates of this circuit.
    pub(crate) fn check_inputs<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a Id>,
    ) -> Result<(), CircuitError>
    where
        Id: 'a,
    {
        for id in ids {
            match self.gates.get(id) {
                None => return Err(CircuitError::UnknownGate(format!("{id:?}"))),
                Some(Gate::Logic { .. }) => {
                    return Err(CircuitError::NotAnInputGate(format!("{id:?}")));
                }
                Some(Gate::Input) => {}
            }
        }
        Ok(())
    }

    /// Evaluates the circuit on the given input bits and returns the value
    /// of every output gate.
    ///
    /// Only the inputs that the outputs depend on are required.
    pub fn evaluate(&self, inputs: &HashMap<Id, bool>) -> Result<HashMap<Id, bool>, CircuitError> {
        self.check_inputs(inputs.keys())?;
        let mut values = inputs.clone();
        for output in &self.outputs {
            self.resolve(output, &mut values, |_, op, a, b| {
                Ok::<_, CircuitError>(op.compute(*a, *b))
            })?;
        }
        Ok(self
            .outputs
            .iter()
            .filter_map(|id| values.get(id).map(|v| (id.clone(), *v)))
            .collect())
    }

    /// Resolves the value of `target` depth first, memoizing every value
    /// computed on the way in `values`.
    ///
    /// Input gates must already have a value in `values`. `gate` computes the
    /// value of a logic gate from the values of its two inputs and is called
    /// at most once per gate.
    pub(crate) fn resolve<V, E>(
        &self,
        target: &Id,
        values: &mut HashMap<Id, V>,
        mut gate: impl FnMut(&Id, Op, &V, &V) -> Result<V, E>,
    ) -> Result<(), E>
    where
        E: From<CircuitError>,
    {
        let Some((target, _)) = self.gates.get_key_value(target) else {
            return Err(CircuitError::UnknownGate(format!("{target:?}")).into());
        };
        let mut stack = vec![(target, false)];
        while let Some((id, expanded)) = stack.pop() {
            if values.contains_key(id) {
                continue;
            }
            let Some(Gate::Logic { op, in0, in1 }) = self.gates.get(id) else {
                return Err(CircuitError::MissingInput(format!("{id:?}")).into());
            };
            if !expanded {
                stack.push((id, true));
                stack.push((in1, false));
                stack.push((in0, false));
                continue;
            }
            let (Some(a), Some(b)) = (values.get(in0), values.get(in1)) else {
                // both inputs were resolved before the gate was revisited
                return Err(CircuitError::Cycle(format!("{id:?}")).into());
            };
            let value = gate(id, *op, a, b)?;
            values.insert(id.clone(), value);
        }
        Ok(())
    }
}

fn topological_sort<Id: Eq + Hash + Clone + fmt::Debug>(
    gates: &HashMap<Id, Gate<Id>>,
    ids: &[Id],
) -> Result<Vec<Id>, CircuitError> {
    let mut visits: HashMap<&Id, Visit> = HashMap::with_capacity(gates.len());
    let mut order = Vec::with_capacity(gates.len());
    for root in ids {
        let mut stack = vec![(root, false)];
        while let Some((id, finished)) = stack.pop() {
            if finished {
                visits.insert(id, Visit::Done);
                order.push(id.clone());
                continue;
            }
            match visits.get(id) {
                Some(Visit::Done) => continue,
                Some(Visit::Active) => return Err(CircuitError::Cycle(format!("{id:?}"))),
                None => {}
            }
            visits.insert(id, Visit::Active);
            stack.push((id, true));
            if let Some((in0, in1)) = gates.get(id).and_then(Gate::inputs) {
                for input in [in1, in0] {
                    match visits.get(input) {
                        Some(Visit::Done) => {}
                        Some(Visit::Active) => {
                            return Err(CircuitError::Cycle(format!("{input:?}")));
                        }
                        None => stack.push((input, false)),
                    }
                }
            }
        }
    }
    Ok(order)
}
