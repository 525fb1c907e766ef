//! pokedex-harvest library: fetches PokeAPI entries and keeps a compact dex.

pub mod ballot;
pub mod data;
pub mod harvest;
pub mod model;

#[cfg(test)]
mod test_support;
