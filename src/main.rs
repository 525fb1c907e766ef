//! # pokedex-harvest
//!
//! Walks PokeAPI from id 1 upwards and writes a compact dex to `pokemons.json`.

use anyhow::{Result, bail};
use clap::{ArgGroup, Parser};
use pokedex_harvest::ballot::{Ballot, Choice};
use pokedex_harvest::data;
use pokedex_harvest::model::padded_id;
use pokedex_harvest::harvest::{self, DEFAULT_BASE_URL, DEFAULT_OUTPUT_PATH, HarvestConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = "pokedex-harvest: fetches PokeAPI entries one id at a time until the API\n\
                  stops answering 200, then writes them all to a single JSON file."
)]
#[command(group(ArgGroup::new("voter_target").args(["ballot", "vote"])))]
struct Args {
    /// Base URL of the pokemon endpoint; ids are appended as path segments
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Where the dex JSON is written (and read by --list / --ballot)
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// First id to request
    #[arg(long, default_value_t = 1)]
    start: u32,

    /// Per-request timeout in seconds (client default when omitted)
    #[arg(long)]
    timeout: Option<u64>,

    /// Print the entries of an existing dex file instead of harvesting
    #[arg(long)]
    list: bool,

    /// Write a blank smash/pass ballot CSV for the current dex
    #[arg(long, value_name = "CSV")]
    ballot: Option<PathBuf>,

    /// Record a choice in an existing ballot CSV (needs --voter, --id, --choice)
    #[arg(long, value_name = "CSV", requires_all = ["voters", "id", "choice"])]
    vote: Option<PathBuf>,

    /// Voter column for --ballot or --vote (repeatable)
    #[arg(long = "voter", value_name = "NAME", requires = "voter_target")]
    voters: Vec<String>,

    /// Dex number the --vote applies to (25 or 025)
    #[arg(long, requires = "vote")]
    id: Option<u32>,

    /// Undecided, Smash or Pass
    #[arg(long, requires = "vote")]
    choice: Option<Choice>,

    /// Print per-voter counts from a ballot CSV
    #[arg(long, value_name = "CSV")]
    tally: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list {
        let dex = data::load_dex(&args.output)?;
        for record in dex {
            println!("{} {} [{}]", record.id, record.name, record.type_names());
        }
        return Ok(());
    }

    if let Some(path) = &args.ballot {
        if args.voters.is_empty() {
            bail!("--ballot needs at least one --voter");
        }
        let dex = data::load_dex(&args.output)?;
        Ballot::template(&dex, &args.voters).write(path)?;
        println!(
            "Wrote ballot for {} entries and {} voters to {}",
            dex.len(),
            args.voters.len(),
            path.display()
        );
        return Ok(());
    }

    if let Some(path) = &args.vote {
        let (Some(id), Some(choice)) = (args.id, args.choice) else {
            bail!("--vote needs --id and --choice");
        };
        let mut ballot = Ballot::read(path)?;
        for voter in &args.voters {
            ballot.set_choice(voter, id, choice)?;
        }
        ballot.write(path)?;
        println!(
            "Marked entry {} as {} for {} in {}",
            padded_id(id),
            choice,
            args.voters.join(", "),
            path.display()
        );
        return Ok(());
    }

    if let Some(path) = &args.tally {
        let ballot = Ballot::read(path)?;
        for (voter, tally) in ballot.tally() {
            println!(
                "{}: Smash {} / Pass {} / Undecided {}",
                voter, tally.smash, tally.pass, tally.undecided
            );
        }
        return Ok(());
    }

    let config = HarvestConfig {
        base_url: args.base_url,
        output: args.output,
        start: args.start,
        timeout: args.timeout.map(Duration::from_secs),
    };
    harvest::run(&config)?;
    Ok(())
}
