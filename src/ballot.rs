//! Smash-or-pass ballots over a harvested dex, stored as CSV.
//!
//! ```text
//! ,ash,misty
//! bulbasaur,Smash,Pass
//! ivysaur,Undecided,Smash
//! ```
//!
//! The `k`-th non-blank row after the header is dex entry `k + 1`; the name
//! column is only there for humans reading the file.

use anyhow::{Context, Result, anyhow, bail};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::model::{SummaryRecord, padded_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Choice {
    #[default]
    Undecided,
    Smash,
    Pass,
}

impl FromStr for Choice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Undecided" => Ok(Choice::Undecided),
            "Smash" => Ok(Choice::Smash),
            "Pass" => Ok(Choice::Pass),
            other => Err(format!("unknown choice '{}'", other)),
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Choice::Undecided => "Undecided",
            Choice::Smash => "Smash",
            Choice::Pass => "Pass",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voter {
    pub name: String,
    /// Keyed by padded dex id; absent means undecided.
    pub choices: HashMap<String, Choice>,
}

impl Voter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            choices: HashMap::new(),
        }
    }

    pub fn choice(&self, id: &str) -> Choice {
        self.choices.get(id).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub smash: usize,
    pub pass: usize,
    pub undecided: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ballot {
    pub voters: Vec<Voter>,
    /// Entry names in dex order, one per row.
    pub entries: Vec<String>,
}

impl Ballot {
    /// A fresh ballot where nobody has decided anything yet.
    pub fn template<S: AsRef<str>>(dex: &[SummaryRecord], voters: &[S]) -> Self {
        Self {
            voters: voters.iter().map(|v| Voter::new(v.as_ref())).collect(),
            entries: dex.iter().map(|r| r.name.clone()).collect(),
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let header = lines.next().ok_or_else(|| anyhow!("ballot is empty"))?;
        let mut voters: Vec<Voter> = header.split(',').skip(1).map(Voter::new).collect();

        let mut entries = Vec::new();
        for (index, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let line_no = index + 2;
            let mut cells = line.split(',');
            let name = cells.next().unwrap_or_default().to_string();
            let choices: Vec<&str> = cells.collect();
            if choices.len() < voters.len() {
                bail!(
                    "line {}: expected {} choices, found {}",
                    line_no,
                    voters.len(),
                    choices.len()
                );
            }

            let id = padded_id(entries.len() as u32 + 1);
            for (voter, cell) in voters.iter_mut().zip(choices) {
                let choice = Choice::from_str(cell.trim())
                    .map_err(|e| anyhow!("line {}: {}", line_no, e))?;
                if choice != Choice::Undecided {
                    voter.choices.insert(id.clone(), choice);
                }
            }
            entries.push(name);
        }

        Ok(Self { voters, entries })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read ballot {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid ballot {}", path.display()))
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for voter in &self.voters {
            out.push(',');
            out.push_str(&voter.name);
        }
        for (row, name) in self.entries.iter().enumerate() {
            let id = padded_id(row as u32 + 1);
            out.push('\n');
            out.push_str(name);
            for voter in &self.voters {
                out.push(',');
                out.push_str(&voter.choice(&id).to_string());
            }
        }
        out
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_csv())
            .with_context(|| format!("failed to write ballot {}", path.display()))
    }

    /// Records `choice` for dex entry `id`, adding the voter column if needed.
    pub fn set_choice(&mut self, voter: &str, id: u32, choice: Choice) -> Result<()> {
        if id == 0 || id as usize > self.entries.len() {
            bail!(
                "no entry {} on this ballot (it has {})",
                padded_id(id),
                self.entries.len()
            );
        }

        let index = match self.voters.iter().position(|v| v.name == voter) {
            Some(index) => index,
            None => {
                self.voters.push(Voter::new(voter));
                self.voters.len() - 1
            }
        };
        let choices = &mut self.voters[index].choices;
        if choice == Choice::Undecided {
            choices.remove(&padded_id(id));
        } else {
            choices.insert(padded_id(id), choice);
        }
        Ok(())
    }

    /// Per-voter counts over every entry of the ballot.
    pub fn tally(&self) -> Vec<(String, Tally)> {
        self.voters
            .iter()
            .map(|voter| {
                let mut tally = Tally::default();
                for row in 0..self.entries.len() {
                    match voter.choice(&padded_id(row as u32 + 1)) {
                        Choice::Smash => tally.smash += 1,
                        Choice::Pass => tally.pass += 1,
                        Choice::Undecided => tally.undecided += 1,
                    }
                }
                (voter.name.clone(), tally)
            })
            .collect()
    }
}
