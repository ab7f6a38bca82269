//! Error types for the codec and the schema generator.
//!
//! Decode errors are fail-fast and carry the path of the member being read
//! plus the discriminator of the innermost polymorphic object that was being
//! decoded when the failure happened.
use thiserror::Error;

use crate::path_de::Path;

#[derive(Debug, Error)]
pub enum CodecError {
    /// No descriptor is registered for the discriminator and the registry has
    /// no default.
    #[error("unknown discriminator `{discriminator}` for interface `{interface}` at {path}")]
    UnknownDiscriminator { interface: String, discriminator: String, path: Path },

    #[error("missing required field `{field}` at {path}{}", observed(.discriminator))]
    MissingRequiredField { field: String, path: Path, discriminator: Option<String> },

    #[error(
        "type mismatch at {path}{}: expected {expected}, found {found}",
        observed(.discriminator)
    )]
    TypeMismatch {
        expected: String,
        found: String,
        path: Path,
        discriminator: Option<String>,
    },

    /// The structural reader could not make sense of the input at all.
    #[error("malformed container at {path}: {reason}")]
    MalformedContainer { reason: String, path: Path },

    #[error("nesting exceeds {limit} levels at {path}{}", observed(.discriminator))]
    DepthExceeded { limit: usize, path: Path, discriminator: Option<String> },

    #[error("no registry for interface `{interface}`")]
    UnregisteredInterface { interface: String },

    /// Failure reported by the serde_json writer.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),
}

fn observed(discriminator: &Option<String>) -> String {
    match discriminator {
        Some(d) => format!(" (in `{d}`)"),
        None => String::new(),
    }
}

impl CodecError {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::UnknownDiscriminator { path, .. }
            | Self::MissingRequiredField { path, .. }
            | Self::TypeMismatch { path, .. }
            | Self::MalformedContainer { path, .. }
            | Self::DepthExceeded { path, .. } => Some(path),
            Self::UnregisteredInterface { .. } | Self::Encode(_) => None,
        }
    }

    /// Discriminator observed at the point of failure, if any.
    pub fn discriminator(&self) -> Option<&str> {
        match self {
            Self::UnknownDiscriminator { discriminator, .. } => Some(discriminator),
            Self::MissingRequiredField { discriminator, .. }
            | Self::TypeMismatch { discriminator, .. }
            | Self::DepthExceeded { discriminator, .. } => discriminator.as_deref(),
            _ => None,
        }
    }

    /// Attach `discriminator` unless a nested decode already recorded one.
    pub(crate) fn observed_in(mut self, discriminator: &str) -> Self {
        match &mut self {
            Self::MissingRequiredField { discriminator: slot, .. }
            | Self::TypeMismatch { discriminator: slot, .. }
            | Self::DepthExceeded { discriminator: slot, .. } => {
                if slot.is_none() {
                    *slot = Some(discriminator.to_owned());
                }
            }
            _ => {}
        }
        self
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    /// A registered example does not survive `decode(encode(example))`.
    #[error("self-check failed for example #{index} of `{title}`: {reason}")]
    SelfCheck { title: String, index: usize, reason: String },

    #[error("no descriptor `{discriminator}` in interface `{interface}`")]
    UnknownVariant { interface: String, discriminator: String },

    #[error(transparent)]
    Codec(#[from] CodecError),
}
