//! Error types for dynamics operations.

use crate::body::BodyHandle;
use thiserror::Error;

/// Errors that can occur during body lifecycle and constraint setup.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DynamicsError {
    /// Attempt to enter dynamic mode with a non-positive or non-finite mass.
    #[error("invalid mass: {reason}")]
    InvalidMass {
        /// Description of what's wrong with the mass.
        reason: String,
    },

    /// Axes supplied to a joint basis setter are not mutually perpendicular.
    #[error("axes are not mutually orthogonal (max |dot| = {max_dot})")]
    NonOrthogonalBasis {
        /// The largest pairwise dot product among the supplied axes.
        max_dot: f64,
    },

    /// A broad phase entry of an unexpected kind was handed to a pair handler.
    #[error("unexpected broad phase entry: {reason}")]
    InvalidPairEntry {
        /// Description of the offending entry.
        reason: String,
    },

    /// Stale or unknown body handle.
    #[error("invalid body handle: {0}")]
    InvalidBodyHandle(BodyHandle),

    /// Invalid timestep.
    #[error("invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(f64),
}

impl DynamicsError {
    /// Create an invalid mass error.
    #[must_use]
    pub fn invalid_mass(reason: impl Into<String>) -> Self {
        Self::InvalidMass {
            reason: reason.into(),
        }
    }

    /// Create an invalid pair entry error.
    #[must_use]
    pub fn invalid_pair_entry(reason: impl Into<String>) -> Self {
        Self::InvalidPairEntry {
            reason: reason.into(),
        }
    }

    /// Check if this is a mass validation error.
    #[must_use]
    pub fn is_invalid_mass(&self) -> bool {
        matches!(self, Self::InvalidMass { .. })
    }

    /// Check if this is a basis orthogonality error.
    #[must_use]
    pub fn is_non_orthogonal_basis(&self) -> bool {
        matches!(self, Self::NonOrthogonalBasis { .. })
    }
}
