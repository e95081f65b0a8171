//! Rock-paper-scissors between two players who do not reveal their hands.
//!
//! Each hand is encoded as 2 bits, `(A, B)` for the first player and `(C, D)`
//! for the second. The [`circuit`] computes the 2 bit result `(E, F)`. The
//! first player garbles with its hand, the second player evaluates with its
//! hand and learns only who won.
use std::{collections::HashMap, fmt, str::FromStr};

use thiserror::Error;

use crate::{
    circuit::{Circuit, CircuitError, Gate},
    protocol::{Error, simulate_2pc},
};

/// Errors specific to the rock-paper-scissors game.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpsError {
    /// The name is not one of the hands.
    #[error("unknown hand {0:?}")]
    UnknownHand(String),
    /// The circuit output `(1, 1)` does not encode a result.
    #[error("({0}, {1}) is not a game result")]
    InvalidOutcome(bool, bool),
    /// The computation did not produce the named output.
    #[error("missing output {0}")]
    MissingOutput(&'static str),
}

/// A player's hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    /// Beats rock, `(0, 0)`.
    Paper,
    /// Beats scissors, `(1, 0)`.
    Rock,
    /// Beats paper, `(0, 1)`.
    Scissors,
    /// Loses against every other hand, `(1, 1)`.
    Lose,
}

impl Hand {
    /// All hands.
    pub const ALL: [Hand; 4] = [Hand::Paper, Hand::Rock, Hand::Scissors, Hand::Lose];

    /// The 2 bit encoding of the hand.
    pub fn bits(self) -> (bool, bool) {
        match self {
            Hand::Paper => (false, false),
            Hand::Rock => (true, false),
            Hand::Scissors => (false, true),
            Hand::Lose => (true, true),
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Hand::Paper => "PAPER",
            Hand::Rock => "ROCK",
            Hand::Scissors => "SCISSORS",
            Hand::Lose => "LOSE",
        })
    }
}

impl FromStr for Hand {
    type Err = RpsError;

    /// Parses `PAPER`/`P`, `ROCK`/`R`, `SCISSORS`/`S` or `LOSE`/`L`, in any
    /// case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PAPER" | "P" => Ok(Hand::Paper),
            "ROCK" | "R" => Ok(Hand::Rock),
            "SCISSORS" | "S" => Ok(Hand::Scissors),
            "LOSE" | "L" => Ok(Hand::Lose),
            _ => Err(RpsError::UnknownHand(s.to_string())),
        }
    }
}

/// The result of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// `(0, 0)`
    Draw,
    /// `(0, 1)`
    SecondWins,
    /// `(1, 0)`
    FirstWins,
}

impl Outcome {
    /// Decodes the circuit outputs `(E, F)`.
    pub fn from_bits(e: bool, f: bool) -> Result<Self, RpsError> {
        match (e, f) {
            (false, false) => Ok(Outcome::Draw),
            (false, true) => Ok(Outcome::SecondWins),
            (true, false) => Ok(Outcome::FirstWins),
            (true, true) => Err(RpsError::InvalidOutcome(e, f)),
        }
    }
}

/// The comparison circuit, with inputs `A`, `B` (first player), `C`, `D`
/// (second player) and outputs `E`, `F`.
pub fn circuit() -> Result<Circuit<String>, CircuitError> {
    let gate = |op: fn(String, String) -> Gate<String>, a: &str, b: &str| {
        op(a.to_string(), b.to_string())
    };
    let gates = [
        ("A", Gate::Input),
        ("B", Gate::Input),
        ("C", Gate::Input),
        ("D", Gate::Input),
        ("AB", gate(Gate::and, "A", "B")),
        ("AC", gate(Gate::and, "A", "C")),
        ("BC", gate(Gate::and, "B", "C")),
        ("BxC", gate(Gate::xor, "B", "C")),
        ("BD", gate(Gate::and, "B", "D")),
        ("CD", gate(Gate::and, "C", "D")),
        ("AD", gate(Gate::and, "A", "D")),
        ("AxD", gate(Gate::xor, "A", "D")),
        ("ACxBD", gate(Gate::xor, "AC", "BD")),
        ("BCxCD", gate(Gate::xor, "BC", "CD")),
        ("ABxAD", gate(Gate::xor, "AB", "AD")),
        ("ACxBDxBCxCD", gate(Gate::xor, "ACxBD", "BCxCD")),
        ("ACxBDxABxAD", gate(Gate::xor, "ACxBD", "ABxAD")),
        ("E", gate(Gate::xor, "ACxBDxABxAD", "BxC")),
        ("F", gate(Gate::xor, "ACxBDxBCxCD", "AxD")),
    ];
    Circuit::new(
        gates.map(|(id, gate)| (id.to_string(), gate)),
        ["E".to_string(), "F".to_string()],
    )
}

/// The garbler's inputs for the first player's hand.
pub fn first_inputs(hand: Hand) -> HashMap<String, bool> {
    let (a, b) = hand.bits();
    HashMap::from([("A".to_string(), a), ("B".to_string(), b)])
}

/// The evaluator's inputs for the second player's hand.
pub fn second_inputs(hand: Hand) -> HashMap<String, bool> {
    let (c, d) = hand.bits();
    HashMap::from([("C".to_string(), c), ("D".to_string(), d)])
}

/// Decodes the outcome from the outputs of the [`circuit`].
pub fn outcome(outputs: &HashMap<String, bool>) -> Result<Outcome, RpsError> {
    let e = outputs.get("E").ok_or(RpsError::MissingOutput("E"))?;
    let f = outputs.get("F").ok_or(RpsError::MissingOutput("F"))?;
    Outcome::from_bits(*e, *f)
}

/// Plays a game as a 2-party computation: the first player garbles the
/// circuit and the second player evaluates it.
pub fn play(first: Hand, second: Hand) -> Result<Outcome, Error> {
    let circuit = circuit()?;
    let outputs = simulate_2pc(&circuit, &first_inputs(first), &second_inputs(second))?;
    Ok(outcome(&outputs)?)
}
