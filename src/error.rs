//! Error module for the Rusty Membrane library.
use std::error::Error;
use std::fmt;

/// Error types for the library.
#[derive(Debug, PartialEq)]
pub enum NeuronError {
    /// Error for invalid parameters, e.g., a zero period or a negative noise level.
    InvalidParameter(String),
    /// Error for non-finite values produced while integrating the membrane model.
    NumericalInstability(String),
    /// Error for statistics requested over an ensemble without any sample.
    EmptyEnsemble,
    /// Error for I/O operations.
    IOError(String),
}

impl fmt::Display for NeuronError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NeuronError::InvalidParameter(e) => write!(f, "Invalid parameters: {}", e),
            NeuronError::NumericalInstability(e) => write!(f, "Numerical instability: {}", e),
            NeuronError::EmptyEnsemble => write!(f, "The ensemble does not contain any sample"),
            NeuronError::IOError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl Error for NeuronError {}
