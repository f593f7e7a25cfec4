//! Encoding of tagged request variants into their wire shapes
//!
//! Every polymorphic request field (message role, tool, tool choice,
//! response format, ...) is a closed enum whose alternatives each map to one
//! wire shape. [`WireEncode`] is the total, side-effect free mapping from an
//! alternative to that shape. Most alternatives produce an object carrying a
//! `type` or `role` discriminator; payload-free choices such as `"auto"`
//! produce a bare string.
//!
//! Request structs derive `Serialize` as usual and the variant fields are
//! serialized through [`WireEncode`] by [`serialize_via_wire!`].

use crate::error::LlmError;
use crate::value::WireValue;
use serde::Serialize;

/// Conversion of a request variant into the JSON shape the provider expects
pub trait WireEncode {
    fn to_wire(&self) -> WireValue;
}

impl<T: WireEncode> WireEncode for Vec<T> {
    fn to_wire(&self) -> WireValue {
        WireValue::Array(self.iter().map(WireEncode::to_wire).collect())
    }
}

impl<T: WireEncode> WireEncode for Option<T> {
    fn to_wire(&self) -> WireValue {
        self.as_ref().map(WireEncode::to_wire).unwrap_or(WireValue::Null)
    }
}

/// Implement `serde::Serialize` for types by way of their [`WireEncode`] impl
#[macro_export]
macro_rules! serialize_via_wire {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ::serde::Serialize for $ty {
                fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    ::serde::Serialize::serialize(
                        &$crate::encode::WireEncode::to_wire(self),
                        serializer,
                    )
                }
            }
        )*
    };
}

/// Serialize a request body to JSON bytes
pub fn encode_body<T: Serialize + ?Sized>(body: &T) -> Result<Vec<u8>, LlmError> {
    serde_json::to_vec(body)
        .map_err(|e| LlmError::encoding_with_source("Failed to encode request body", e))
}
