//! Decoding of JSON arrays whose elements have position-dependent shapes.
//!
//! The node encodes several records as `[hash, { ...record without hash... }]`
//! or `[address, timestamp]` pairs. [`decode_tuple`] decodes each leading
//! element independently into the matching slot of a Rust tuple.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::value::RawValue;

use crate::http::DecodeError;

/// A Rust tuple that can be filled from the leading elements of a JSON array.
///
/// Implemented for tuples of one to four [`DeserializeOwned`] types.
pub trait HeterogeneousTuple: Sized {
    /// Number of leading array elements this tuple consumes.
    const ARITY: usize;

    /// Decodes from already split elements. `elements` holds at least
    /// [`Self::ARITY`] entries.
    fn from_elements(elements: &[Box<RawValue>]) -> Result<Self, DecodeError>;
}

fn element<T: DeserializeOwned>(elements: &[Box<RawValue>], index: usize) -> Result<T, DecodeError> {
    serde_json::from_str(elements[index].get()).map_err(|source| DecodeError::TupleElement { index, source })
}

macro_rules! heterogeneous_tuple {
    ($arity:expr; $($ty:ident $idx:tt),+) => {
        impl<$($ty: DeserializeOwned),+> HeterogeneousTuple for ($($ty,)+) {
            const ARITY: usize = $arity;

            fn from_elements(elements: &[Box<RawValue>]) -> Result<Self, DecodeError> {
                Ok(($(element::<$ty>(elements, $idx)?,)+))
            }
        }
    };
}

heterogeneous_tuple!(1; A 0);
heterogeneous_tuple!(2; A 0, B 1);
heterogeneous_tuple!(3; A 0, B 1, C 2);
heterogeneous_tuple!(4; A 0, B 1, C 2, D 3);

/// Decodes the leading elements of the JSON array `raw` into `T`.
///
/// Elements past `T::ARITY` are ignored. Fails if the input is not an array,
/// if it is shorter than the tuple, or if any element does not parse into its
/// slot.
///
/// ```rust
/// use tezos_rpc::decode::decode_tuple;
///
/// let (hash, level): (String, u32) = decode_tuple(r#"["BLockHash", 42]"#).unwrap();
/// assert_eq!(hash, "BLockHash");
/// assert_eq!(level, 42);
/// ```
pub fn decode_tuple<T: HeterogeneousTuple>(raw: &str) -> Result<T, DecodeError> {
    let elements: Vec<Box<RawValue>> = serde_json::from_str(raw)?;
    tuple_from_elements(&elements)
}

/// Same as [`decode_tuple`] for an array that has already been split.
pub fn tuple_from_elements<T: HeterogeneousTuple>(elements: &[Box<RawValue>]) -> Result<T, DecodeError> {
    if elements.len() < T::ARITY {
        return Err(DecodeError::ShortTuple {
            expected: T::ARITY,
            got: elements.len(),
        });
    }
    T::from_elements(elements)
}

/// Serde adapter for fields and `Deserialize` impls that receive a
/// heterogeneous array.
pub fn deserialize_tuple<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: HeterogeneousTuple,
{
    let elements = Vec::<Box<RawValue>>::deserialize(deserializer)?;
    tuple_from_elements(&elements).map_err(serde::de::Error::custom)
}
