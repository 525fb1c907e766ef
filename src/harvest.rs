//! The fetch-transform-dump loop.
//!
//! Ids are requested one at a time starting from `start`. Every 200 response
//! becomes a [`SummaryRecord`]; the first non-200 response ends the harvest
//! and the collected records are written out in one piece. Any other failure
//! aborts the run before anything is written.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::data::{self, Fetched};
use crate::model::SummaryRecord;

pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2/pokemon";
pub const DEFAULT_OUTPUT_PATH: &str = "src/jvmMain/resources/pokemons.json";

/// Anything that can answer "what is pokemon `id`?".
pub trait PokemonSource {
    fn fetch(&mut self, id: u32) -> Result<Fetched>;
}

/// The live PokeAPI, or anything serving the same routes.
pub struct HttpSource {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        Ok(Self {
            client: data::http_client(timeout)?,
            base_url: base_url.into(),
        })
    }
}

impl PokemonSource for HttpSource {
    fn fetch(&mut self, id: u32) -> Result<Fetched> {
        data::fetch_pokemon(&self.client, &self.base_url, id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestState {
    Fetching(u32),
    Done,
}

impl HarvestState {
    fn step<S: PokemonSource>(
        self,
        source: &mut S,
        records: &mut Vec<SummaryRecord>,
        on_record: &mut dyn FnMut(&SummaryRecord),
    ) -> Result<Self> {
        let HarvestState::Fetching(id) = self else {
            return Ok(self);
        };

        match source
            .fetch(id)
            .with_context(|| format!("failed to fetch pokemon {}", id))?
        {
            Fetched::Found(source_record) => {
                let record = SummaryRecord::from(source_record);
                on_record(&record);
                records.push(record);
                match id.checked_add(1) {
                    Some(next) => Ok(HarvestState::Fetching(next)),
                    None => {
                        log::warn!("pokemon {} is the last representable id, stopping", id);
                        Ok(HarvestState::Done)
                    }
                }
            }
            Fetched::Missing(status) => {
                log::info!("pokemon {} answered {}, stopping", id, status);
                Ok(HarvestState::Done)
            }
        }
    }
}

/// Runs the loop to completion and returns the records in fetch order.
pub fn harvest<S, F>(source: &mut S, start: u32, mut on_record: F) -> Result<Vec<SummaryRecord>>
where
    S: PokemonSource,
    F: FnMut(&SummaryRecord),
{
    let mut records = Vec::new();
    let mut state = HarvestState::Fetching(start);
    while state != HarvestState::Done {
        state = state.step(source, &mut records, &mut on_record)?;
    }
    Ok(records)
}

#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub base_url: String,
    pub output: PathBuf,
    pub start: u32,
    /// `None` keeps the HTTP client's own default.
    pub timeout: Option<Duration>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
            start: 1,
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    pub count: usize,
    pub output: PathBuf,
}

pub fn progress_line(record: &SummaryRecord) -> String {
    format!("id:{} name:{} succefully added!", record.id, record.name)
}

pub const DONE_LINE: &str = "No more pokemons!";

/// Harvests from `source` and writes the dex to `output`, printing progress.
pub fn run_with_source<S: PokemonSource>(
    source: &mut S,
    start: u32,
    output: &Path,
) -> Result<HarvestReport> {
    let records = harvest(source, start, |record| println!("{}", progress_line(record)))?;
    println!("{}", DONE_LINE);

    data::write_dex(output, &records)?;
    log::info!("wrote {} entries to {}", records.len(), output.display());

    Ok(HarvestReport {
        count: records.len(),
        output: output.to_path_buf(),
    })
}

pub fn run(config: &HarvestConfig) -> Result<HarvestReport> {
    log::debug!("harvest config: {:?}", config);
    let mut source = HttpSource::new(config.base_url.clone(), config.timeout)?;
    run_with_source(&mut source, config.start, &config.output)
}
