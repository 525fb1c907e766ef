//! Upstream and output record types for the pokedex harvest.

use serde::{Deserialize, Serialize};

/// Template for the high-resolution artwork, keyed by the padded id.
const IMAGE_URL_BASE: &str = "https://assets.pokemon.com/assets/cms2/img/pokedex/full";
/// Template for the small sprite, keyed by the padded id.
const SPRITE_URL_BASE: &str = "https://assets.pokemon.com/assets/cms2/img/pokedex/detail";

/// One `/pokemon/{id}` response from PokeAPI, reduced to the fields we read.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceRecord {
    pub id: u32,
    pub name: String,
    pub types: Vec<SourceTypeSlot>,
}

/// An entry of `types` in the upstream payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceTypeSlot {
    pub slot: u32,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedResource {
    pub name: String,
}

/// A type as stored in the dex file. Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSlot {
    pub name: String,
    pub slot: u32,
}

/// A dex entry as written to `pokemons.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// Zero-padded to at least three digits ("001").
    pub id: String,
    pub name: String,
    pub image: String,
    pub image_sprite: String,
    pub types: Vec<TypeSlot>,
}

/// Formats a numeric id the way dex entries and asset URLs expect it.
pub fn padded_id(id: u32) -> String {
    format!("{:03}", id)
}

pub fn image_url(padded: &str) -> String {
    format!("{}/{}.png", IMAGE_URL_BASE, padded)
}

pub fn sprite_url(padded: &str) -> String {
    format!("{}/{}.png", SPRITE_URL_BASE, padded)
}

impl From<SourceRecord> for SummaryRecord {
    fn from(source: SourceRecord) -> Self {
        let id = padded_id(source.id);
        let types = source
            .types
            .into_iter()
            .map(|t| TypeSlot {
                name: t.kind.name,
                slot: t.slot,
            })
            .collect();

        SummaryRecord {
            image: image_url(&id),
            image_sprite: sprite_url(&id),
            id,
            name: source.name,
            types,
        }
    }
}

impl SummaryRecord {
    /// Comma-joined type names, in slot order as received.
    pub fn type_names(&self) -> String {
        self.types
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}
