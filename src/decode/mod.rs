//! JSON decoding helpers shared by the node record types.
//!
//! - [`tuple`] decodes arrays whose elements have position-dependent shapes,
//!   such as `[hash, operation]`.
//! - [`variant`] decodes objects whose shape is selected by a discriminator
//!   field, with one [`Registry`] per variant family.

pub mod tuple;
pub mod variant;

pub use tuple::{HeterogeneousTuple, decode_tuple, deserialize_tuple, tuple_from_elements};
pub use variant::{
    Discriminated, Registry, RegistryBuilder, VariantFamily, decode_variants, decode_variants_with,
    deserialize_sequence, deserialize_variant,
};
