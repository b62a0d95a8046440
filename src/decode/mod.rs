//! Resilient decoding of generator text into response shapes.
//!
//! The pipeline is total: boundary extraction, the special-character escape
//! pass, structural validation with one repair round, and typed decoding.
//! When any of those fail, field salvage runs over the fence-stripped text,
//! and the shape's default value covers the rest.

pub mod boundary;
pub mod fallback;
pub mod recovery;
pub mod repair;
pub mod typed;
pub mod validate;

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::shapes::{ResponseShape, Shape, ShapeKind};
use validate::Validation;

/// How a decoded value was produced, from most to least trustworthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeQuality {
    /// The extracted span parsed without changes.
    Structured,
    /// The span parsed after escape or repair passes.
    Repaired,
    /// Fields were salvaged by pattern matching.
    Recovered,
    /// Nothing usable; the shape's default value.
    Defaulted,
}

impl DecodeQuality {
    /// Whether the value came from a successful parse.
    #[must_use]
    pub fn is_structured(self) -> bool {
        matches!(self, DecodeQuality::Structured | DecodeQuality::Repaired)
    }
}

impl fmt::Display for DecodeQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecodeQuality::Structured => "structured",
            DecodeQuality::Repaired => "repaired",
            DecodeQuality::Recovered => "recovered",
            DecodeQuality::Defaulted => "defaulted",
        };
        f.write_str(name)
    }
}

/// A decoded response together with how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decoded<T = ResponseShape> {
    /// The decoded value.
    pub shape: T,
    /// How the value was produced.
    pub quality: DecodeQuality,
}

impl Decoded {
    /// Narrows the response to the statically known shape `T`.
    ///
    /// A mismatched variant cannot come out of [`decode`] for `T::KIND`; if
    /// one is handed in anyway, `T`'s default value is used.
    #[must_use]
    pub fn into_shape<T: Shape>(self) -> Decoded<T> {
        match T::from_response(self.shape) {
            Some(shape) => Decoded {
                shape,
                quality: self.quality,
            },
            None => Decoded {
                shape: T::default(),
                quality: DecodeQuality::Defaulted,
            },
        }
    }
}

/// Decodes `raw` into the shape named by `kind`. Never fails.
#[must_use]
pub fn decode(raw: &str, kind: ShapeKind) -> Decoded {
    if let Some(span) = boundary::extract(raw) {
        let escaped = repair::escape_specials(&span);
        let parsed = match validate::validate(&escaped) {
            Validation::Valid(value) if escaped == span => Some((value, DecodeQuality::Structured)),
            Validation::Valid(value) | Validation::Repaired(value) => {
                Some((value, DecodeQuality::Repaired))
            }
            Validation::Unrecoverable => None,
        };
        if let Some((value, quality)) = parsed {
            match typed::decode_value(&value, kind) {
                Ok(shape) => {
                    debug!(%kind, %quality, "decoded response");
                    return Decoded { shape, quality };
                }
                Err(err) => debug!(%kind, %err, "typed decode failed"),
            }
        }
    } else {
        debug!(%kind, "no JSON span in response");
    }

    let stripped = boundary::strip_fences(raw);
    if let Some(shape) = recovery::recover(&stripped, kind) {
        warn!(%kind, "response decoded by partial recovery");
        return Decoded {
            shape,
            quality: DecodeQuality::Recovered,
        };
    }

    warn!(%kind, "response unusable; using default");
    Decoded {
        shape: fallback::default_response(kind),
        quality: DecodeQuality::Defaulted,
    }
}

/// Decodes `raw` as the statically known shape `T`.
#[must_use]
pub fn decode_as<T: Shape>(raw: &str) -> Decoded<T> {
    decode(raw, T::KIND).into_shape()
}
