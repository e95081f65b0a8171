//! Secure 2-party computation with Yao garbled circuits, built from first
//! principles.
//!
//! Two parties, a garbler and an evaluator, jointly compute a boolean circuit
//! on their private inputs. The evaluator learns the outputs, and neither
//! party learns the other's inputs. Inputs of the evaluator are moved with an
//! oblivious transfer that is itself built on an additively homomorphic
//! cryptosystem.
//!
//! ## Main Components
//!
//! * [`elgamal`]: exponential ElGamal over a safe-prime group, with
//!   homomorphic ciphertext algebra and a zero-knowledge proof that a
//!   ciphertext encrypts a bit.
//! * [`ot`]: 1-out-of-2 oblivious transfer of [`label::Label`]s.
//! * [`circuit`]: boolean circuits and their direct evaluation.
//! * [`garble`]: garbling of a circuit and evaluation of the garbled circuit,
//!   classic or with free XOR gates.
//! * [`protocol`]: the [`protocol::simulate_2pc`] function running both
//!   parties in-process.
//! * [`rps`]: rock-paper-scissors as a 2-party computation.
//!
//! ## Example
//!
//! ```
//! use std::collections::HashMap;
//!
//! use yao2pc::{
//!     circuit::{Circuit, Gate},
//!     protocol::simulate_2pc,
//! };
//!
//! # fn main() -> Result<(), yao2pc::protocol::Error> {
//! let circuit = Circuit::new(
//!     [
//!         (0, Gate::Input),
//!         (1, Gate::Input),
//!         (2, Gate::and(0, 1)),
//!     ],
//!     [2],
//! )?;
//! // the garbler provides wire 0, the evaluator wire 1
//! let outputs = simulate_2pc(
//!     &circuit,
//!     &HashMap::from([(0, true)]),
//!     &HashMap::from([(1, true)]),
//! )?;
//! assert_eq!(Some(&true), outputs.get(&2));
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Properties
//!
//! The protocols are secure against semi-honest parties only, and the group
//! parameters are far too small for real-world use. The crate is meant for
//! studying the constructions.
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod cipher;
pub mod circuit;
pub mod elgamal;
pub mod garble;
pub mod label;
pub mod ot;
pub mod protocol;
pub mod rps;
pub mod utils;
