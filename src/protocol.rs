//! Secure 2-party computation of a garbled circuit, simulated in-process.
use std::{collections::HashMap, fmt, hash::Hash};

use rand::{CryptoRng, Rng, SeedableRng, rngs::StdRng};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{Level, debug, instrument, trace};

use crate::{
    cipher::{Aes128Ecb, BlockCipher},
    circuit::{Circuit, CircuitError},
    garble::{self, GarbleError, GarbleMode, GarbledCircuit, Garbling, InputTransfer},
    ot::{Challenge, Response},
    rps::RpsError,
    utils::{deserialize, serialize},
};

/// A custom error type for all 2-party computation operations.
///
/// Failures of the oblivious transfer, the cryptosystem and the block cipher
/// surface through [`GarbleError`].
#[derive(Debug, Error)]
pub enum Error {
    /// The specified circuit is invalid, or the inputs do not match it.
    #[error(transparent)]
    Circuit(#[from] CircuitError),
    /// Garbling or evaluating the garbled circuit failed.
    #[error(transparent)]
    Garble(#[from] GarbleError),
    /// A message could not be (de-)serialized.
    #[error("serialization failed: {0}")]
    Serde(#[from] bincode::Error),
    /// The rock-paper-scissors game could not be decided.
    #[error(transparent)]
    Rps(#[from] RpsError),
}

/// Simulates the 2-party computation of `circuit`, with AES-128 garbling and
/// thread-local randomness, and returns the outputs learned by the evaluator.
pub fn simulate_2pc<Id>(
    circuit: &Circuit<Id>,
    garbler_inputs: &HashMap<Id, bool>,
    evaluator_inputs: &HashMap<Id, bool>,
) -> Result<HashMap<Id, bool>, Error>
where
    Id: Eq + Hash + Clone + fmt::Debug + Serialize + DeserializeOwned,
{
    simulate_2pc_with(
        circuit,
        garbler_inputs,
        evaluator_inputs,
        &Aes128Ecb,
        &mut rand::rng(),
    )
}

/// Simulates the 2-party computation of `circuit` with classic garbling and
/// the given cipher and randomness.
pub fn simulate_2pc_with<Id, C, R>(
    circuit: &Circuit<Id>,
    garbler_inputs: &HashMap<Id, bool>,
    evaluator_inputs: &HashMap<Id, bool>,
    cipher: &C,
    rng: &mut R,
) -> Result<HashMap<Id, bool>, Error>
where
    Id: Eq + Hash + Clone + fmt::Debug + Serialize + DeserializeOwned,
    C: BlockCipher + ?Sized,
    R: CryptoRng + Rng + ?Sized,
{
    simulate_2pc_with_mode(
        circuit,
        garbler_inputs,
        evaluator_inputs,
        GarbleMode::Classic,
        cipher,
        rng,
    )
}

/// Simulates the 2-party computation of `circuit` in the given garbling mode.
///
/// Every message from one party to the other passes through its serialized
/// form: the garbled circuit, each oblivious transfer challenge and each
/// response.
#[instrument(level = Level::DEBUG, skip(circuit, garbler_inputs, evaluator_inputs, cipher, rng), err)]
pub fn simulate_2pc_with_mode<Id, C, R>(
    circuit: &Circuit<Id>,
    garbler_inputs: &HashMap<Id, bool>,
    evaluator_inputs: &HashMap<Id, bool>,
    mode: GarbleMode,
    cipher: &C,
    rng: &mut R,
) -> Result<HashMap<Id, bool>, Error>
where
    Id: Eq + Hash + Clone + fmt::Debug + Serialize + DeserializeOwned,
    C: BlockCipher + ?Sized,
    R: CryptoRng + Rng + ?Sized,
{
    let garbling = garble::garble_with_mode(circuit, garbler_inputs, mode, cipher, rng)?;

    let msg = serialize(garbling.garbled_circuit())?;
    trace!(bytes = msg.len(), "sending garbled circuit");
    let garbled: GarbledCircuit<Id> = deserialize(&msg)?;

    let mut garbler = Loopback {
        garbling: &garbling,
        rng: StdRng::from_seed(rng.random()),
    };
    let outputs = garble::evaluate_garbled(
        circuit,
        &garbled,
        evaluator_inputs,
        &mut garbler,
        cipher,
        rng,
    )?;
    debug!(outputs = outputs.len(), "evaluator learned the outputs");
    Ok(outputs)
}

/// The garbler answering oblivious transfers over a serializing loopback.
struct Loopback<'a, Id> {
    garbling: &'a Garbling<Id>,
    rng: StdRng,
}

fn transmit<T: Serialize + DeserializeOwned>(msg: &T) -> Result<T, GarbleError> {
    let bytes = serialize(msg).map_err(|e| GarbleError::Channel(format!("{e:?}")))?;
    deserialize(&bytes).map_err(|e| GarbleError::Channel(format!("{e:?}")))
}

impl<Id: Eq + Hash + fmt::Debug> InputTransfer<Id> for Loopback<'_, Id> {
    fn transfer(&mut self, wire: &Id, challenge: &Challenge) -> Result<Response, GarbleError> {
        let challenge = transmit(challenge)?;
        let response = self.garbling.respond(wire, &challenge, &mut self.rng)?;
        transmit(&response)
    }
}
