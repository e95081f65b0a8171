//! Yao garbled circuits: garbling by the garbler, evaluation by the evaluator.
//!
//! Every wire that is not an output gets two random labels, one standing for
//! `false` and one for `true`. A logic gate becomes a table of 4 rows, one
//! per combination `(i, j)` of input bits. Each row is the 32 byte payload
//!
//! ```text
//! label of the gate's output bit  || KEY_MARKER   (internal gates)
//! output bit as 16 byte integer   || INT_MARKER   (output gates)
//! ```
//!
//! encrypted first under the label of bit `j` on the second input and then
//! under the label of bit `i` on the first input. The rows are shuffled, so
//! their position reveals nothing. Holding one label per input, the
//! evaluator can strip both layers of exactly one row; the other rows decrypt
//! to garbage without a valid marker.
//!
//! The garbler reveals the labels of its own input bits directly. Labels for
//! the evaluator's inputs are moved by [oblivious transfer](crate::ot), one
//! instance per wire, so that the garbler never learns the evaluator's bits.
//! Only these transferred labels are restricted to the
//! [OT label width](crate::label::OT_LABEL_LEADING_ZEROS); all other labels
//! are uniform 128-bit values.
//!
//! In [`GarbleMode::FreeXor`] the two labels of a wire differ by a global
//! secret offset `Δ`. An XOR gate whose inputs both follow this rule gets no
//! table: its labels are the XOR of its input labels, and the evaluator XORs
//! the labels it holds. Transferred labels are too narrow to share a 128-bit
//! offset, so an XOR gate fed by an evaluator input keeps its table.
use std::{
    collections::{HashMap, HashSet},
    fmt,
    hash::Hash,
};

use rand::{CryptoRng, Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{Level, debug, instrument, trace};

use crate::{
    cipher::{BlockCipher, CipherError},
    circuit::{Circuit, CircuitError, Gate, Op},
    label::Label,
    ot::{self, Challenge, OtError, Receiver, Response},
};

/// Trailer of a row carrying a plaintext bit.
pub const INT_MARKER: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];

/// Trailer of a row carrying a label.
pub const KEY_MARKER: [u8; 16] = [0; 16];

/// Size of a garbled table row in bytes.
pub const ROW_BYTES: usize = 2 * Label::BYTES;

/// Errors raised while garbling or evaluating a garbled circuit.
///
/// Gate ids are rendered with their `Debug` representation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GarbleError {
    /// The circuit or the provided inputs are invalid.
    #[error(transparent)]
    Circuit(#[from] CircuitError),
    /// A row could not be encrypted or decrypted.
    #[error(transparent)]
    Cipher(#[from] CipherError),
    /// The oblivious transfer of an input label failed.
    #[error("oblivious transfer failed: {0}")]
    Ot(#[from] OtError),
    /// An output gate is an input gate, so it has no table to carry its bit.
    #[error("output gate {0} is an input gate")]
    OutputIsInput(String),
    /// An output gate is used as the input of another gate.
    #[error("output gate {0} is used as a gate input")]
    OutputFeedsGate(String),
    /// A wire has no label although one is required.
    #[error("no label for wire {0}")]
    MissingLabel(String),
    /// A wire is fed by both parties.
    #[error("input gate {0} is provided by both parties")]
    InputOwnedByBoth(String),
    /// A message between garbler and evaluator could not be exchanged.
    #[error("channel error: {0}")]
    Channel(String),
    /// An evaluator input was requested for a wire that is not transferable.
    #[error("no oblivious transfer is offered for wire {0}")]
    NoTransfer(String),
    /// The garbled circuit lacks the table of a gate.
    #[error("no garbled table for gate {0}")]
    MissingTable(String),
    /// No row of the table decrypted to a valid payload.
    #[error("no row of the garbled table of gate {0} is valid")]
    NoValidRow(String),
    /// More than one row of the table decrypted to a valid payload.
    #[error("several rows of the garbled table of gate {0} are valid")]
    AmbiguousRows(String),
    /// A row decrypted to a bit where a label was expected, or vice versa.
    #[error("the garbled table of gate {0} has the wrong kind of payload")]
    UnexpectedPayload(String),
}

/// The 4 shuffled, doubly encrypted rows of a garbled logic gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarbledTable(pub [[u8; ROW_BYTES]; 4]);

/// How wire labels are chosen and which gates get a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GarbleMode {
    /// Independent labels on every wire and a table for every logic gate.
    #[default]
    Classic,
    /// Labels related by a global offset, with table-free XOR gates.
    FreeXor,
}

/// Everything the garbler sends to the evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "Id: Serialize + Eq + Hash",
    deserialize = "Id: Deserialize<'de> + Eq + Hash"
))]
pub struct GarbledCircuit<Id> {
    /// How the circuit was garbled.
    pub mode: GarbleMode,
    /// The garbled table of every logic gate that needs one.
    pub tables: HashMap<Id, GarbledTable>,
    /// The labels of the garbler's input bits.
    pub garbler_labels: HashMap<Id, Label>,
}

/// The garbler's state after garbling: the garbled circuit to send and the
/// oblivious transfer senders for the evaluator's input wires.
#[derive(Clone)]
pub struct Garbling<Id> {
    garbled: GarbledCircuit<Id>,
    ot_senders: HashMap<Id, ot::Sender>,
}

impl<Id: fmt::Debug> fmt::Debug for Garbling<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Garbling")
            .field("garbled", &self.garbled)
            .field("transfer_wires", &self.ot_senders.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<Id: Eq + Hash + fmt::Debug> Garbling<Id> {
    /// The garbled circuit, to be sent to the evaluator.
    pub fn garbled_circuit(&self) -> &GarbledCircuit<Id> {
        &self.garbled
    }

    /// The input wires whose labels are offered by oblivious transfer.
    pub fn transfer_wires(&self) -> impl Iterator<Item = &Id> {
        self.ot_senders.keys()
    }

    /// Answers the evaluator's oblivious transfer challenge for `wire`.
    pub fn respond<R: CryptoRng + Rng + ?Sized>(
        &self,
        wire: &Id,
        challenge: &Challenge,
        rng: &mut R,
    ) -> Result<Response, GarbleError> {
        let sender = self
            .ot_senders
            .get(wire)
            .ok_or_else(|| GarbleError::NoTransfer(format!("{wire:?}")))?;
        Ok(sender.respond(challenge, rng)?)
    }
}

/// The evaluator's view of the garbler during input transfer.
pub trait InputTransfer<Id> {
    /// Sends the oblivious transfer challenge for `wire` and returns the
    /// garbler's response.
    fn transfer(&mut self, wire: &Id, challenge: &Challenge) -> Result<Response, GarbleError>;
}

/// An [`InputTransfer`] answering directly from a [`Garbling`] in the same
/// process.
pub struct LocalTransfer<'a, Id, R> {
    garbling: &'a Garbling<Id>,
    rng: R,
}

impl<'a, Id, R> LocalTransfer<'a, Id, R> {
    /// Answers challenges from `garbling`, drawing the sender's randomness
    /// from `rng`.
    pub fn new(garbling: &'a Garbling<Id>, rng: R) -> Self {
        Self { garbling, rng }
    }
}

impl<Id: Eq + Hash + fmt::Debug, R: CryptoRng + Rng> InputTransfer<Id>
    for LocalTransfer<'_, Id, R>
{
    fn transfer(&mut self, wire: &Id, challenge: &Challenge) -> Result<Response, GarbleError> {
        self.garbling.respond(wire, challenge, &mut self.rng)
    }
}

/// The plaintext recovered from a valid row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payload {
    Bit(bool),
    Label(Label),
}

impl Payload {
    fn encode(self) -> [u8; ROW_BYTES] {
        let (value, marker) = match self {
            Payload::Bit(bit) => (u128::from(bit).to_be_bytes(), INT_MARKER),
            Payload::Label(label) => (label.to_bytes(), KEY_MARKER),
        };
        let mut row = [0; ROW_BYTES];
        row[..Label::BYTES].copy_from_slice(&value);
        row[Label::BYTES..].copy_from_slice(&marker);
        row
    }

    fn decode(row: &[u8; ROW_BYTES]) -> Option<Self> {
        let (value, marker) = row.split_at(Label::BYTES);
        let value: [u8; 16] = value.try_into().ok()?;
        if bool::from(marker.ct_eq(&INT_MARKER[..])) {
            match u128::from_be_bytes(value) {
                0 => Some(Payload::Bit(false)),
                1 => Some(Payload::Bit(true)),
                _ => None,
            }
        } else if bool::from(marker.ct_eq(&KEY_MARKER[..])) {
            Some(Payload::Label(Label::from_bytes(value)))
        } else {
            None
        }
    }
}

fn labels_of<'a, Id: Eq + Hash + fmt::Debug>(
    labels: &'a HashMap<Id, [Label; 2]>,
    wire: &Id,
) -> Result<&'a [Label; 2], GarbleError> {
    labels
        .get(wire)
        .ok_or_else(|| GarbleError::MissingLabel(format!("{wire:?}")))
}

fn check_garblable<Id: Eq + Hash + Clone + fmt::Debug>(
    circuit: &Circuit<Id>,
) -> Result<(), GarbleError> {
    for output in circuit.outputs() {
        if circuit.gate(output).is_some_and(|gate| gate.is_input()) {
            return Err(GarbleError::OutputIsInput(format!("{output:?}")));
        }
    }
    for (_, gate) in circuit.gates() {
        if let Some((in0, in1)) = gate.inputs() {
            for wire in [in0, in1] {
                if circuit.is_output(wire) {
                    return Err(GarbleError::OutputFeedsGate(format!("{wire:?}")));
                }
            }
        }
    }
    Ok(())
}

/// Garbles `circuit` with the garbler's input bits in
/// [`GarbleMode::Classic`].
///
/// Every input gate without a garbler bit is treated as an evaluator input
/// and gets an oblivious transfer sender. Fails if an output gate is an input
/// gate or feeds another gate.
pub fn garble<Id, C, R>(
    circuit: &Circuit<Id>,
    garbler_inputs: &HashMap<Id, bool>,
    cipher: &C,
    rng: &mut R,
) -> Result<Garbling<Id>, GarbleError>
where
    Id: Eq + Hash + Clone + fmt::Debug,
    C: BlockCipher + ?Sized,
    R: CryptoRng + Rng + ?Sized,
{
    garble_with_mode(circuit, garbler_inputs, GarbleMode::Classic, cipher, rng)
}

/// Samples two distinct labels.
fn label_pair<R: Rng + ?Sized>(rng: &mut R, sample: fn(&mut R) -> Label) -> [Label; 2] {
    let k0 = sample(rng);
    let mut k1 = sample(rng);
    while k1 == k0 {
        k1 = sample(rng);
    }
    [k0, k1]
}

/// Garbles `circuit` with the garbler's input bits in the given mode.
///
/// See [`garble`] for the treatment of inputs and the preconditions.
#[instrument(level = Level::DEBUG, skip(circuit, garbler_inputs, cipher, rng), err)]
pub fn garble_with_mode<Id, C, R>(
    circuit: &Circuit<Id>,
    garbler_inputs: &HashMap<Id, bool>,
    mode: GarbleMode,
    cipher: &C,
    rng: &mut R,
) -> Result<Garbling<Id>, GarbleError>
where
    Id: Eq + Hash + Clone + fmt::Debug,
    C: BlockCipher + ?Sized,
    R: CryptoRng + Rng + ?Sized,
{
    circuit.check_inputs(garbler_inputs.keys())?;
    check_garblable(circuit)?;

    let transferred: HashSet<&Id> = circuit
        .input_gates()
        .filter(|id| !garbler_inputs.contains_key(*id))
        .collect();
    let delta = match mode {
        GarbleMode::Classic => None,
        GarbleMode::FreeXor => {
            let mut delta = Label::random(rng);
            while delta == Label::ZERO {
                delta = Label::random(rng);
            }
            Some(delta)
        }
    };

    let mut labels: HashMap<Id, [Label; 2]> = HashMap::new();
    let mut free = HashSet::new();
    for (id, gate) in circuit.gates() {
        if circuit.is_output(id) {
            continue;
        }
        let pair = if transferred.contains(id) {
            label_pair(rng, Label::random_for_ot)
        } else if let Some(delta) = delta {
            let k0 = match gate {
                Gate::Logic {
                    op: Op::Xor,
                    in0,
                    in1,
                } if !transferred.contains(in0) && !transferred.contains(in1) => {
                    free.insert(id);
                    labels_of(&labels, in0)?[0] ^ labels_of(&labels, in1)?[0]
                }
                _ => Label::random(rng),
            };
            [k0, k0 ^ delta]
        } else {
            label_pair(rng, Label::random)
        };
        labels.insert(id.clone(), pair);
    }

    let mut tables = HashMap::new();
    for (id, gate) in circuit.gates() {
        let Gate::Logic { op, in0, in1 } = gate else {
            continue;
        };
        if free.contains(id) {
            continue;
        }
        let k0 = labels_of(&labels, in0)?;
        let k1 = labels_of(&labels, in1)?;
        let out = if circuit.is_output(id) {
            None
        } else {
            Some(labels_of(&labels, id)?)
        };
        let mut rows = [[0; ROW_BYTES]; 4];
        for (row, (i, j)) in rows.iter_mut().zip([(0, 0), (0, 1), (1, 0), (1, 1)]) {
            let bit = op.compute(i == 1, j == 1);
            let payload = match out {
                None => Payload::Bit(bit),
                Some(out) => Payload::Label(out[usize::from(bit)]),
            };
            *row = payload.encode();
            cipher.encrypt(&k1[j], row)?;
            cipher.encrypt(&k0[i], row)?;
        }
        rows.shuffle(rng);
        tables.insert(id.clone(), GarbledTable(rows));
    }
    trace!(tables = tables.len(), free = free.len(), "garbled gate tables");

    let mut garbler_labels = HashMap::with_capacity(garbler_inputs.len());
    for (id, bit) in garbler_inputs {
        let pair = labels_of(&labels, id)?;
        garbler_labels.insert(id.clone(), pair[usize::from(*bit)]);
    }
    let mut ot_senders = HashMap::with_capacity(transferred.len());
    for id in transferred {
        let [k0, k1] = *labels_of(&labels, id)?;
        ot_senders.insert(id.clone(), ot::Sender::new(k0, k1));
    }
    debug!(
        gates = circuit.len(),
        garbler_inputs = garbler_labels.len(),
        evaluator_inputs = ot_senders.len(),
        "garbled circuit"
    );
    Ok(Garbling {
        garbled: GarbledCircuit {
            mode,
            tables,
            garbler_labels,
        },
        ot_senders,
    })
}

/// Evaluates a garbled circuit with the evaluator's input bits and returns
/// the bit of every output gate.
///
/// The labels of `evaluator_inputs` are obtained from the garbler through
/// `transfer`, with a fresh receiver key pair per wire.
#[instrument(level = Level::DEBUG, skip_all, err)]
pub fn evaluate_garbled<Id, T, C, R>(
    circuit: &Circuit<Id>,
    garbled: &GarbledCircuit<Id>,
    evaluator_inputs: &HashMap<Id, bool>,
    transfer: &mut T,
    cipher: &C,
    rng: &mut R,
) -> Result<HashMap<Id, bool>, GarbleError>
where
    Id: Eq + Hash + Clone + fmt::Debug,
    T: InputTransfer<Id> + ?Sized,
    C: BlockCipher + ?Sized,
    R: CryptoRng + Rng + ?Sized,
{
    circuit.check_inputs(evaluator_inputs.keys())?;
    circuit.check_inputs(garbled.garbler_labels.keys())?;

    let mut values: HashMap<Id, Payload> = garbled
        .garbler_labels
        .iter()
        .map(|(id, label)| (id.clone(), Payload::Label(*label)))
        .collect();
    for (wire, bit) in evaluator_inputs {
        if values.contains_key(wire) {
            return Err(GarbleError::InputOwnedByBoth(format!("{wire:?}")));
        }
        let receiver = Receiver::new(*bit, rng);
        let challenge = receiver.challenge(rng)?;
        let response = transfer.transfer(wire, &challenge)?;
        values.insert(wire.clone(), Payload::Label(receiver.receive(&response)?));
    }
    debug!(
        transferred = evaluator_inputs.len(),
        "received evaluator input labels"
    );

    for output in circuit.outputs() {
        circuit.resolve(output, &mut values, |id, op, a, b| {
            let (Payload::Label(a), Payload::Label(b)) = (a, b) else {
                return Err(GarbleError::UnexpectedPayload(format!("{id:?}")));
            };
            let payload = match garbled.tables.get(id) {
                Some(table) => decrypt_table(id, table, a, b, cipher)?,
                None if garbled.mode == GarbleMode::FreeXor && op == Op::Xor => {
                    Payload::Label(*a ^ *b)
                }
                None => return Err(GarbleError::MissingTable(format!("{id:?}"))),
            };
            if circuit.is_output(id) != matches!(payload, Payload::Bit(_)) {
                return Err(GarbleError::UnexpectedPayload(format!("{id:?}")));
            }
            trace!(gate = ?id, "ungarbled gate");
            Ok(payload)
        })?;
    }

    let mut outputs = HashMap::with_capacity(circuit.outputs().len());
    for id in circuit.outputs() {
        match values.get(id) {
            Some(Payload::Bit(bit)) => {
                outputs.insert(id.clone(), *bit);
            }
            _ => return Err(GarbleError::UnexpectedPayload(format!("{id:?}"))),
        }
    }
    Ok(outputs)
}

fn decrypt_table<Id: fmt::Debug, C: BlockCipher + ?Sized>(
    id: &Id,
    table: &GarbledTable,
    a: &Label,
    b: &Label,
    cipher: &C,
) -> Result<Payload, GarbleError> {
    let mut found = None;
    for row in &table.0 {
        let mut row = *row;
        cipher.decrypt(a, &mut row)?;
        cipher.decrypt(b, &mut row)?;
        if let Some(payload) = Payload::decode(&row) {
            if found.replace(payload).is_some() {
                return Err(GarbleError::AmbiguousRows(format!("{id:?}")));
            }
        }
    }
    found.ok_or_else(|| GarbleError::NoValidRow(format!("{id:?}")))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::{
        cipher::Aes128Ecb,
        label::OT_LABEL_LEADING_ZEROS,
        utils::{deserialize, serialize},
    };

    fn single_gate(op: Op) -> Circuit<&'static str> {
        Circuit::new(
            [("a", Gate::Input), ("b", Gate::Input), ("out", Gate::logic(op, "a", "b"))],
            ["out"],
        )
        .unwrap()
    }

    fn run(
        circuit: &Circuit<&'static str>,
        garbler_inputs: &HashMap<&'static str, bool>,
        evaluator_inputs: &HashMap<&'static str, bool>,
        rng: &mut ChaCha20Rng,
    ) -> Result<HashMap<&'static str, bool>, GarbleError> {
        run_in(GarbleMode::Classic, circuit, garbler_inputs, evaluator_inputs, rng)
    }

    fn run_in(
        mode: GarbleMode,
        circuit: &Circuit<&'static str>,
        garbler_inputs: &HashMap<&'static str, bool>,
        evaluator_inputs: &HashMap<&'static str, bool>,
        rng: &mut ChaCha20Rng,
    ) -> Result<HashMap<&'static str, bool>, GarbleError> {
        let garbling = garble_with_mode(circuit, garbler_inputs, mode, &Aes128Ecb, rng)?;
        let mut transfer = LocalTransfer::new(&garbling, ChaCha20Rng::from_rng(&mut *rng));
        evaluate_garbled(
            circuit,
            garbling.garbled_circuit(),
            evaluator_inputs,
            &mut transfer,
            &Aes128Ecb,
            rng,
        )
    }

    #[test]
    fn test_payload_encoding() {
        let bit = Payload::Bit(true).encode();
        assert_eq!(1, bit[15]);
        assert_eq!(INT_MARKER, bit[16..]);
        let label = Label::from_u128(0xabc);
        let row = Payload::Label(label).encode();
        assert_eq!(label.to_bytes(), row[..16]);
        assert_eq!(KEY_MARKER, row[16..]);

        for payload in [
            Payload::Bit(false),
            Payload::Bit(true),
            Payload::Label(label),
            Payload::Label(Label::ZERO),
        ] {
            assert_eq!(Some(payload), Payload::decode(&payload.encode()));
        }

        let mut two = Payload::Bit(false).encode();
        two[15] = 2;
        assert_eq!(None, Payload::decode(&two));
        let mut garbage = Payload::Label(label).encode();
        garbage[31] = 7;
        assert_eq!(None, Payload::decode(&garbage));
    }

    #[test]
    fn test_every_gate_and_split() {
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        for op in Op::ALL {
            let circuit = single_gate(op);
            for a in [false, true] {
                for b in [false, true] {
                    let expected = HashMap::from([("out", op.compute(a, b))]);
                    let all = HashMap::from([("a", a), ("b", b)]);
                    let none = HashMap::new();
                    let just_a = HashMap::from([("a", a)]);
                    let just_b = HashMap::from([("b", b)]);
                    for (garbler, evaluator) in [(&all, &none), (&just_a, &just_b), (&none, &all)]
                    {
                        let outputs = run(&circuit, garbler, evaluator, &mut rng).unwrap();
                        assert_eq!(expected, outputs, "{op} {a} {b}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_deeper_circuit() {
        // (a & b) ^ (b | c), nor'ed with a
        let circuit = Circuit::new(
            [
                (0, Gate::Input),
                (1, Gate::Input),
                (2, Gate::Input),
                (3, Gate::and(0, 1)),
                (4, Gate::or(1, 2)),
                (5, Gate::xor(3, 4)),
                (6, Gate::nor(5, 0)),
                (7, Gate::nand(3, 4)),
            ],
            [6, 7],
        )
        .unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        for bits in 0..8u8 {
            let [a, b, c] = [bits & 1 != 0, bits & 2 != 0, bits & 4 != 0];
            let expected = circuit
                .evaluate(&HashMap::from([(0, a), (1, b), (2, c)]))
                .unwrap();
            let garbling = garble(&circuit, &HashMap::from([(1, b)]), &Aes128Ecb, &mut rng).unwrap();
            let mut transfer = LocalTransfer::new(&garbling, ChaCha20Rng::seed_from_u64(2));
            let outputs = evaluate_garbled(
                &circuit,
                garbling.garbled_circuit(),
                &HashMap::from([(0, a), (2, c)]),
                &mut transfer,
                &Aes128Ecb,
                &mut rng,
            )
            .unwrap();
            assert_eq!(expected, outputs);
        }
    }

    #[test]
    fn test_rejects_ungarblable_circuits() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let input_output = Circuit::new([("a", Gate::Input)], ["a"]).unwrap();
        assert_eq!(
            Err(GarbleError::OutputIsInput("\"a\"".to_string())),
            garble(&input_output, &HashMap::new(), &Aes128Ecb, &mut rng).map(|_| ())
        );
        let chained = Circuit::new(
            [
                ("a", Gate::Input),
                ("x", Gate::and("a", "a")),
                ("y", Gate::or("x", "a")),
            ],
            ["x", "y"],
        )
        .unwrap();
        assert_eq!(
            Err(GarbleError::OutputFeedsGate("\"x\"".to_string())),
            garble(&chained, &HashMap::new(), &Aes128Ecb, &mut rng).map(|_| ())
        );
        assert_eq!(
            Err(GarbleError::Circuit(CircuitError::NotAnInputGate(
                "\"out\"".to_string()
            ))),
            garble(
                &single_gate(Op::And),
                &HashMap::from([("out", true)]),
                &Aes128Ecb,
                &mut rng
            )
            .map(|_| ())
        );
    }

    #[test]
    fn test_labels_are_distinct_and_transferable() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let circuit = single_gate(Op::Xor);
        let garbling = garble(&circuit, &HashMap::new(), &Aes128Ecb, &mut rng).unwrap();
        let mut wires: Vec<_> = garbling.transfer_wires().copied().collect();
        wires.sort();
        assert_eq!(vec!["a", "b"], wires);
        for sender in garbling.ot_senders.values() {
            assert_ne!(sender.m0, sender.m1);
            assert!(sender.m0.leading_zeros() >= OT_LABEL_LEADING_ZEROS);
            assert!(sender.m1.leading_zeros() >= OT_LABEL_LEADING_ZEROS);
        }
    }

    /// Decrypts the single valid row of a table.
    fn open(table: &GarbledTable, a: &Label, b: &Label) -> Payload {
        decrypt_table(&"gate", table, a, b, &Aes128Ecb).unwrap()
    }

    #[test]
    fn test_untransferred_labels_are_full_width() {
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let circuit = Circuit::new(
            [
                ("a", Gate::Input),
                ("b", Gate::Input),
                ("c", Gate::and("a", "b")),
                ("out", Gate::or("c", "a")),
            ],
            ["out"],
        )
        .unwrap();
        for mode in [GarbleMode::Classic, GarbleMode::FreeXor] {
            for bits in 0..4u8 {
                let inputs = HashMap::from([("a", bits & 1 != 0), ("b", bits & 2 != 0)]);
                let garbling = garble_with_mode(&circuit, &inputs, mode, &Aes128Ecb, &mut rng)
                    .unwrap();
                let garbled = garbling.garbled_circuit();
                assert_eq!(0, garbling.transfer_wires().count());

                // a uniform 128-bit label has 64 leading zeros with
                // probability 2^-64
                let a = garbled.garbler_labels["a"];
                let b = garbled.garbler_labels["b"];
                assert!(a.leading_zeros() < 64, "{mode:?}");
                assert!(b.leading_zeros() < 64, "{mode:?}");
                let Payload::Label(c) = open(&garbled.tables["c"], &a, &b) else {
                    panic!("internal gate carries a bit");
                };
                assert!(c.leading_zeros() < 64, "{mode:?}");
                assert_eq!(
                    Payload::Bit(inputs["a"]),
                    open(&garbled.tables["out"], &c, &a)
                );
            }
        }
    }

    /// XOR heavy circuit with a mix of free and tabled XOR gates.
    fn parity_mix() -> Circuit<&'static str> {
        Circuit::new(
            [
                ("a", Gate::Input),
                ("b", Gate::Input),
                ("c", Gate::Input),
                ("ab", Gate::xor("a", "b")),
                ("abc", Gate::xor("ab", "c")),
                ("and", Gate::and("ab", "c")),
                ("mix", Gate::xor("abc", "and")),
                ("out0", Gate::or("mix", "a")),
                ("out1", Gate::xor("abc", "b")),
                ("out2", Gate::nand("and", "mix")),
            ],
            ["out0", "out1", "out2"],
        )
        .unwrap()
    }

    #[test]
    fn test_free_xor_matches_classic() {
        let mut rng = ChaCha20Rng::seed_from_u64(10);
        let circuit = parity_mix();
        for bits in 0..8u8 {
            let [a, b, c] = [bits & 1 != 0, bits & 2 != 0, bits & 4 != 0];
            let all = HashMap::from([("a", a), ("b", b), ("c", c)]);
            let expected = circuit.evaluate(&all).unwrap();
            let none = HashMap::new();
            let garbler_ab = HashMap::from([("a", a), ("b", b)]);
            let evaluator_c = HashMap::from([("c", c)]);
            let garbler_c = HashMap::from([("c", c)]);
            for (garbler, evaluator) in [
                (&all, &none),
                (&garbler_ab, &evaluator_c),
                (&garbler_c, &garbler_ab),
                (&none, &all),
            ] {
                let classic =
                    run_in(GarbleMode::Classic, &circuit, garbler, evaluator, &mut rng).unwrap();
                let free_xor =
                    run_in(GarbleMode::FreeXor, &circuit, garbler, evaluator, &mut rng).unwrap();
                assert_eq!(expected, classic, "{bits:03b}");
                assert_eq!(expected, free_xor, "{bits:03b}");
            }
        }
    }

    #[test]
    fn test_free_xor_gates_have_no_table() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let circuit = parity_mix();
        let mut tabled = |garbler_inputs: &HashMap<&'static str, bool>, mode: GarbleMode| {
            let garbling =
                garble_with_mode(&circuit, garbler_inputs, mode, &Aes128Ecb, &mut rng).unwrap();
            assert_eq!(mode, garbling.garbled_circuit().mode);
            let mut ids: Vec<_> = garbling.garbled_circuit().tables.keys().copied().collect();
            ids.sort();
            ids
        };
        let all = HashMap::from([("a", true), ("b", false), ("c", true)]);
        let garbler_ab = HashMap::from([("a", true), ("b", false)]);

        assert_eq!(7, tabled(&all, GarbleMode::Classic).len());
        // inner XOR gates over garbler wires and gate outputs are free
        assert_eq!(
            vec!["and", "out0", "out1", "out2"],
            tabled(&all, GarbleMode::FreeXor)
        );
        // "abc" depends on the transferred wire "c"
        assert_eq!(
            vec!["abc", "and", "out0", "out1", "out2"],
            tabled(&garbler_ab, GarbleMode::FreeXor)
        );
        // "mix" only reads gate outputs
        assert_eq!(
            vec!["ab", "abc", "and", "out0", "out1", "out2"],
            tabled(&HashMap::new(), GarbleMode::FreeXor)
        );
    }

    #[test]
    fn test_free_xor_transfers_narrow_labels() {
        let mut rng = ChaCha20Rng::seed_from_u64(12);
        let circuit = parity_mix();
        let garbler_inputs = HashMap::from([("a", true)]);
        let garbling = garble_with_mode(
            &circuit,
            &garbler_inputs,
            GarbleMode::FreeXor,
            &Aes128Ecb,
            &mut rng,
        )
        .unwrap();
        assert_eq!(2, garbling.ot_senders.len());
        for sender in garbling.ot_senders.values() {
            assert_ne!(sender.m0, sender.m1);
            assert!(sender.m0.leading_zeros() >= OT_LABEL_LEADING_ZEROS);
            assert!(sender.m1.leading_zeros() >= OT_LABEL_LEADING_ZEROS);
        }
    }

    #[test]
    fn test_free_xor_needs_mode_flag() {
        let mut rng = ChaCha20Rng::seed_from_u64(13);
        let circuit = parity_mix();
        let all = HashMap::from([("a", true), ("b", true), ("c", false)]);
        let garbling =
            garble_with_mode(&circuit, &all, GarbleMode::FreeXor, &Aes128Ecb, &mut rng).unwrap();
        let mut relabeled = garbling.garbled_circuit().clone();
        relabeled.mode = GarbleMode::Classic;
        let mut transfer = LocalTransfer::new(&garbling, ChaCha20Rng::seed_from_u64(14));
        assert_eq!(
            Err(GarbleError::MissingTable("\"ab\"".to_string())),
            evaluate_garbled(
                &circuit,
                &relabeled,
                &HashMap::new(),
                &mut transfer,
                &Aes128Ecb,
                &mut rng,
            )
        );
    }

    #[test]
    fn test_garbled_circuit_survives_serialization() {
        let mut rng = ChaCha20Rng::seed_from_u64(15);
        let circuit = Circuit::new(
            [
                (0u32, Gate::Input),
                (1, Gate::Input),
                (2, Gate::xor(0, 1)),
                (3, Gate::nor(2, 1)),
            ],
            [3],
        )
        .unwrap();
        for mode in [GarbleMode::Classic, GarbleMode::FreeXor] {
            let garbling =
                garble_with_mode(&circuit, &HashMap::from([(0, true)]), mode, &Aes128Ecb, &mut rng)
                    .unwrap();
            let bytes = serialize(garbling.garbled_circuit()).unwrap();
            let received: GarbledCircuit<u32> = deserialize(&bytes).unwrap();
            assert_eq!(mode, received.mode);
            assert_eq!(garbling.garbled_circuit().tables, received.tables);
            assert_eq!(
                garbling.garbled_circuit().garbler_labels,
                received.garbler_labels
            );

            let mut transfer = LocalTransfer::new(&garbling, ChaCha20Rng::seed_from_u64(16));
            let outputs = evaluate_garbled(
                &circuit,
                &received,
                &HashMap::from([(1, false)]),
                &mut transfer,
                &Aes128Ecb,
                &mut rng,
            )
            .unwrap();
            // !((1 ^ 0) | 0)
            assert_eq!(HashMap::from([(3, false)]), outputs);
        }
    }

    #[test]
    fn test_debug_hides_transfer_labels() {
        let mut rng = ChaCha20Rng::seed_from_u64(17);
        let garbling = garble(&single_gate(Op::And), &HashMap::new(), &Aes128Ecb, &mut rng).unwrap();
        let debug = format!("{garbling:?}");
        for sender in garbling.ot_senders.values() {
            assert!(!debug.contains(&sender.m0.to_hex()));
            assert!(!debug.contains(&sender.m1.to_hex()));
        }
        assert!(debug.contains("transfer_wires"));
    }

    #[test]
    fn test_evaluation_errors() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let circuit = single_gate(Op::And);
        let garbler_inputs = HashMap::from([("a", true)]);
        let garbling = garble(&circuit, &garbler_inputs, &Aes128Ecb, &mut rng).unwrap();
        let mut transfer = LocalTransfer::new(&garbling, ChaCha20Rng::seed_from_u64(6));

        // the garbler already provides "a"
        assert_eq!(
            Err(GarbleError::InputOwnedByBoth("\"a\"".to_string())),
            evaluate_garbled(
                &circuit,
                garbling.garbled_circuit(),
                &HashMap::from([("a", false), ("b", true)]),
                &mut transfer,
                &Aes128Ecb,
                &mut rng,
            )
        );
        // nobody provides "b"
        assert_eq!(
            Err(GarbleError::Circuit(CircuitError::MissingInput(
                "\"b\"".to_string()
            ))),
            evaluate_garbled(
                &circuit,
                garbling.garbled_circuit(),
                &HashMap::new(),
                &mut transfer,
                &Aes128Ecb,
                &mut rng,
            )
        );

        let mut missing = garbling.garbled_circuit().clone();
        missing.tables.clear();
        assert_eq!(
            Err(GarbleError::MissingTable("\"out\"".to_string())),
            evaluate_garbled(
                &circuit,
                &missing,
                &HashMap::from([("b", true)]),
                &mut transfer,
                &Aes128Ecb,
                &mut rng,
            )
        );
    }

    #[test]
    fn test_corrupted_tables() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let circuit = single_gate(Op::Or);
        let inputs = HashMap::from([("a", false), ("b", true)]);
        let garbling = garble(&circuit, &inputs, &Aes128Ecb, &mut rng).unwrap();
        let garbled = garbling.garbled_circuit();
        let a = garbled.garbler_labels["a"];
        let b = garbled.garbler_labels["b"];
        let table = &garbled.tables["out"];
        assert_eq!(
            Ok(Payload::Bit(true)),
            decrypt_table(&"out", table, &a, &b, &Aes128Ecb)
        );

        // swapped layers
        assert_eq!(
            Err(GarbleError::NoValidRow("\"out\"".to_string())),
            decrypt_table(&"out", table, &b, &a, &Aes128Ecb)
        );

        let valid = table
            .0
            .iter()
            .copied()
            .find(|row| {
                let mut row = *row;
                Aes128Ecb.decrypt(&a, &mut row).unwrap();
                Aes128Ecb.decrypt(&b, &mut row).unwrap();
                Payload::decode(&row).is_some()
            })
            .unwrap();
        let duplicated = GarbledTable([valid, valid, table.0[0], table.0[1]]);
        assert_eq!(
            Err(GarbleError::AmbiguousRows("\"out\"".to_string())),
            decrypt_table(&"out", &duplicated, &a, &b, &Aes128Ecb)
        );

        let mut flipped = table.clone();
        for row in &mut flipped.0 {
            row[ROW_BYTES - 1] ^= 1;
        }
        assert_eq!(
            Err(GarbleError::NoValidRow("\"out\"".to_string())),
            decrypt_table(&"out", &flipped, &a, &b, &Aes128Ecb)
        );
    }

    #[test]
    fn test_row_position_is_independent_of_inputs() {
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let circuit = single_gate(Op::And);
        let inputs = HashMap::from([("a", false), ("b", false)]);
        let trials = 400;
        let mut positions = [0; 4];
        for _ in 0..trials {
            let garbling = garble(&circuit, &inputs, &Aes128Ecb, &mut rng).unwrap();
            let garbled = garbling.garbled_circuit();
            let a = garbled.garbler_labels["a"];
            let b = garbled.garbler_labels["b"];
            let valid: Vec<usize> = (0..4)
                .filter(|i| {
                    let mut row = garbled.tables["out"].0[*i];
                    Aes128Ecb.decrypt(&a, &mut row).unwrap();
                    Aes128Ecb.decrypt(&b, &mut row).unwrap();
                    Payload::decode(&row).is_some()
                })
                .collect();
            assert_eq!(1, valid.len());
            positions[valid[0]] += 1;
        }
        // expected 100 each, standard deviation below 9
        for count in positions {
            assert!((50..150).contains(&count), "{positions:?}");
        }
    }
}
