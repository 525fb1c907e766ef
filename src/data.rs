use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use crate::model::{SourceRecord, SummaryRecord};

/// Outcome of asking the upstream for one id.
#[derive(Debug)]
pub enum Fetched {
    Found(SourceRecord),
    /// Any status other than 200; ends a harvest.
    Missing(StatusCode),
}

pub fn http_client(timeout: Option<Duration>) -> Result<reqwest::blocking::Client> {
    let mut builder = reqwest::blocking::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

pub fn pokemon_url(base_url: &str, id: u32) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), id)
}

pub fn fetch_pokemon(
    client: &reqwest::blocking::Client,
    base_url: &str,
    id: u32,
) -> Result<Fetched> {
    let url = pokemon_url(base_url, id);
    log::debug!("GET {}", url);

    let response = client
        .get(&url)
        .send()
        .with_context(|| format!("request to {} failed", url))?;
    let status = response.status();
    if status != StatusCode::OK {
        log::debug!("{} answered {}", url, status);
        return Ok(Fetched::Missing(status));
    }

    let text = response
        .text()
        .with_context(|| format!("failed to read body of {}", url))?;
    let record: SourceRecord = serde_json::from_str(&text)
        .with_context(|| format!("unexpected payload from {}", url))?;
    Ok(Fetched::Found(record))
}

/// Two-space pretty printing with every non-ASCII character written as a
/// `\uXXXX` escape (surrogate pairs above the BMP, lowercase hex).
struct AsciiPrettyFormatter<'a> {
    inner: PrettyFormatter<'a>,
}

impl AsciiPrettyFormatter<'_> {
    fn new() -> Self {
        Self {
            inner: PrettyFormatter::with_indent(b"  "),
        }
    }
}

impl Formatter for AsciiPrettyFormatter<'_> {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if c.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..i])?;
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + c.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}

/// Writes the dex as a 2-space indented JSON array, replacing any existing file.
pub fn write_dex(path: &Path, records: &[SummaryRecord]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let file =
        fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = io::BufWriter::new(file);
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut writer, AsciiPrettyFormatter::new());
    records.serialize(&mut serializer)?;
    writer.flush()?;
    Ok(())
}

pub fn load_dex(path: &Path) -> Result<Vec<SummaryRecord>> {
    if !path.exists() {
        bail!("Dex file not found: {}", path.display());
    }
    let file = fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    let records: Vec<SummaryRecord> = serde_json::from_reader(reader)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeSlot;
    use crate::test_support::{StubServer, pokemon_json};

    fn record(id: &str, name: &str) -> SummaryRecord {
        SummaryRecord {
            id: id.to_string(),
            name: name.to_string(),
            image: format!("full/{}.png", id),
            image_sprite: format!("detail/{}.png", id),
            types: vec![TypeSlot {
                name: "normal".to_string(),
                slot: 1,
            }],
        }
    }

    #[test]
    fn test_pokemon_url_trims_trailing_slash() {
        assert_eq!(
            pokemon_url("https://pokeapi.co/api/v2/pokemon/", 7),
            "https://pokeapi.co/api/v2/pokemon/7"
        );
        assert_eq!(pokemon_url("http://x/p", 12), "http://x/p/12");
    }

    #[test]
    fn test_fetch_found_and_missing() {
        let server = StubServer::start(vec![(
            "/pokemon/1",
            200,
            pokemon_json(1, "bulbasaur", &["grass", "poison"]),
        )]);
        let base = format!("{}/pokemon", server.base_url);
        let client = http_client(Some(Duration::from_secs(5))).unwrap();

        match fetch_pokemon(&client, &base, 1).unwrap() {
            Fetched::Found(record) => {
                assert_eq!(record.id, 1);
                assert_eq!(record.name, "bulbasaur");
                assert_eq!(record.types.len(), 2);
            }
            other => panic!("expected a record, got {:?}", other),
        }

        match fetch_pokemon(&client, &base, 2).unwrap() {
            Fetched::Missing(status) => assert_eq!(status, StatusCode::NOT_FOUND),
            other => panic!("expected a miss, got {:?}", other),
        }
    }

    #[test]
    fn test_fetch_other_success_status_is_missing() {
        let server = StubServer::start(vec![(
            "/pokemon/1",
            203,
            pokemon_json(1, "bulbasaur", &["grass", "poison"]),
        )]);
        let base = format!("{}/pokemon", server.base_url);
        let client = http_client(Some(Duration::from_secs(5))).unwrap();

        match fetch_pokemon(&client, &base, 1).unwrap() {
            Fetched::Missing(status) => {
                assert_eq!(status, StatusCode::NON_AUTHORITATIVE_INFORMATION)
            }
            other => panic!("expected a miss, got {:?}", other),
        }
    }

    #[test]
    fn test_fetch_malformed_body_is_an_error() {
        let server = StubServer::start(vec![("/pokemon/1", 200, "{\"id\": 1}".to_string())]);
        let base = format!("{}/pokemon", server.base_url);
        let client = http_client(Some(Duration::from_secs(5))).unwrap();

        let err = fetch_pokemon(&client, &base, 1).unwrap_err();
        assert!(err.to_string().contains("unexpected payload"));
    }

    #[test]
    fn test_write_dex_two_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resources").join("pokemons.json");

        write_dex(&path, &[record("001", "bulbasaur")]).unwrap();
        let text = fs::read_to_string(&path).unwrap();

        assert!(text.starts_with("[\n  {\n    \"id\": \"001\",\n    \"name\": \"bulbasaur\","));
        assert!(text.ends_with("\n]"));
    }

    #[test]
    fn test_write_dex_empty_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pokemons.json");
        fs::write(&path, "stale content that is much longer than an empty array").unwrap();

        write_dex(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_write_dex_escapes_non_ascii() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pokemons.json");

        write_dex(
            &path,
            &[record("669", "flab\u{e9}b\u{e9}"), record("999", "nidoran\u{2640}\u{1f525}")],
        )
        .unwrap();
        let text = fs::read_to_string(&path).unwrap();

        assert!(text.is_ascii());
        assert!(text.contains(r#""name": "flab\u00e9b\u00e9","#));
        assert!(text.contains(r#""name": "nidoran\u2640\ud83d\udd25","#));
        assert_eq!(load_dex(&path).unwrap()[0].name, "flab\u{e9}b\u{e9}");
    }

    #[test]
    fn test_load_dex_round_trip_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pokemons.json");
        let records = vec![record("001", "bulbasaur"), record("002", "ivysaur")];
        write_dex(&path, &records).unwrap();

        assert_eq!(load_dex(&path).unwrap(), records);

        let err = load_dex(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
