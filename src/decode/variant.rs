//! Discriminator-based decoding of polymorphic records.
//!
//! Several node records carry a tag field (`kind`, `status`) that selects the
//! shape of the rest of the object. A [`Registry`] maps each known tag to a
//! decoder for the concrete type. Elements whose tag is unknown, or missing,
//! decode into the family's generic fallback so that a protocol upgrade that
//! adds new kinds never breaks decoding of a whole response.

use std::collections::HashMap;
use std::fmt;

use serde::de::{self, DeserializeOwned, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::value::RawValue;

use crate::http::DecodeError;

/// A decoded value that can report the discriminator it was selected by.
pub trait Discriminated {
    fn discriminator(&self) -> &str;
}

/// A variant family backed by a process-wide registry.
///
/// Implementors are usually enums with one arm per registered kind plus a
/// generic fallback arm.
pub trait VariantFamily: Discriminated + Sized + 'static {
    fn registry() -> &'static Registry<Self>;
}

type DecodeFn<T> = Box<dyn Fn(&RawValue) -> serde_json::Result<T> + Send + Sync>;

/// Maps discriminator strings to decoders producing `T`.
///
/// A registry is immutable once built and safe to share between threads.
pub struct Registry<T> {
    family: &'static str,
    field: &'static str,
    decoders: HashMap<&'static str, DecodeFn<T>>,
    fallback: fn(String) -> T,
}

impl<T: 'static> Registry<T> {
    /// Starts a registry for `family` (used in error messages) keyed by the
    /// object field `field`. `fallback` builds the generic value for unknown
    /// discriminators; it receives an empty string when the field is absent.
    pub fn builder(family: &'static str, field: &'static str, fallback: fn(String) -> T) -> RegistryBuilder<T> {
        RegistryBuilder {
            registry: Registry {
                family,
                field,
                decoders: HashMap::new(),
                fallback,
            },
        }
    }

    pub fn family(&self) -> &'static str {
        self.family
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn contains(&self, discriminator: &str) -> bool {
        self.decoders.contains_key(discriminator)
    }

    /// Registered discriminators, in no particular order.
    pub fn discriminators(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.decoders.keys().copied()
    }

    /// Decodes a single tagged object.
    pub fn decode_value(&self, raw: &RawValue) -> Result<T, DecodeError> {
        self.decode_at(None, raw)
    }

    /// Decodes a JSON array of tagged objects, preserving element order.
    pub fn decode_array(&self, raw: &str) -> Result<Vec<T>, DecodeError> {
        let fragments: Vec<Box<RawValue>> = serde_json::from_str(raw)?;
        self.decode_fragments(&fragments)
    }

    /// Decodes already split array elements, preserving their order.
    pub fn decode_fragments(&self, fragments: &[Box<RawValue>]) -> Result<Vec<T>, DecodeError> {
        fragments
            .iter()
            .enumerate()
            .map(|(index, raw)| self.decode_at(Some(index), raw))
            .collect()
    }

    fn decode_at(&self, index: Option<usize>, raw: &RawValue) -> Result<T, DecodeError> {
        let probe = DiscriminatorProbe { field: self.field };
        let discriminator = probe
            .deserialize(&mut serde_json::Deserializer::from_str(raw.get()))
            .map_err(|source| DecodeError::Discriminator {
                family: self.family,
                index,
                source,
            })?
            .unwrap_or_default();

        match self.decoders.get(discriminator.as_str()) {
            Some(decode) => decode(raw).map_err(|source| DecodeError::Variant {
                family: self.family,
                index,
                discriminator,
                source,
            }),
            None => Ok((self.fallback)(discriminator)),
        }
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.decoders.keys().collect();
        kinds.sort();
        f.debug_struct("Registry")
            .field("family", &self.family)
            .field("field", &self.field)
            .field("discriminators", &kinds)
            .finish()
    }
}

pub struct RegistryBuilder<T> {
    registry: Registry<T>,
}

impl<T: 'static> RegistryBuilder<T> {
    /// Registers the concrete type `V` for `discriminator`; `wrap` lifts it
    /// into the family type, typically an enum constructor.
    ///
    /// A later registration for the same discriminator replaces the earlier one.
    pub fn register<V, F>(mut self, discriminator: &'static str, wrap: F) -> Self
    where
        V: DeserializeOwned,
        F: Fn(V) -> T + Send + Sync + 'static,
    {
        let decode: DecodeFn<T> = Box::new(move |raw: &RawValue| serde_json::from_str::<V>(raw.get()).map(&wrap));
        self.registry.decoders.insert(discriminator, decode);
        self
    }

    pub fn build(self) -> Registry<T> {
        self.registry
    }
}

/// Decodes a JSON array of `T` using its family registry.
pub fn decode_variants<T: VariantFamily>(raw: &str) -> Result<Vec<T>, DecodeError> {
    T::registry().decode_array(raw)
}

/// Decodes a JSON array using an explicit registry.
pub fn decode_variants_with<T: 'static>(raw: &str, registry: &Registry<T>) -> Result<Vec<T>, DecodeError> {
    registry.decode_array(raw)
}

/// Serde adapter for a single tagged object, for use in `Deserialize` impls.
pub fn deserialize_variant<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: VariantFamily,
{
    let raw = Box::<RawValue>::deserialize(deserializer)?;
    T::registry().decode_value(&raw).map_err(de::Error::custom)
}

/// Serde adapter for `#[serde(deserialize_with = "...")]` on `Vec<T>` fields.
/// Errors name the failing element index.
pub fn deserialize_sequence<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: VariantFamily,
{
    let fragments = Vec::<Box<RawValue>>::deserialize(deserializer)?;
    T::registry().decode_fragments(&fragments).map_err(de::Error::custom)
}

/// Reads only the discriminator field of an object, skipping everything else.
struct DiscriminatorProbe<'a> {
    field: &'a str,
}

impl<'de> DeserializeSeed<'de> for DiscriminatorProbe<'_> {
    type Value = Option<String>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for DiscriminatorProbe<'_> {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "an object with an optional string field `{}`", self.field)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut found = None;
        while let Some(key) = map.next_key::<String>()? {
            if key == self.field && found.is_none() {
                found = Some(map.next_value::<Option<String>>()?);
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(found.flatten())
    }
}
