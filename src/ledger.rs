use std::{
    ffi::OsStr,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    str::FromStr,
};

use derive_more::{Constructor, Deref, DerefMut};
use indexmap::IndexMap;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid input path, expected a non-empty file path")]
    InvalidPath,
    #[error("no such file: {0}")]
    FileNotFound(PathBuf),
    #[error("unsupported input format, expected a .txt file: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("malformed amount `{token}` on line {line}")]
    MalformedAmount { token: String, line: usize },
    #[error("No data read from file..")]
    EmptyInput,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Constructor, Debug, Deref, DerefMut, PartialEq)]
pub struct Ledger(IndexMap<String, Decimal>);

impl Ledger {
    pub fn from_path(path: &Path) -> Result<Self, LedgerError> {
        if path.as_os_str().is_empty() {
            return Err(LedgerError::InvalidPath);
        }
        if !path.is_file() {
            return Err(LedgerError::FileNotFound(path.to_path_buf()));
        }
        if path.extension() != Some(OsStr::new("txt")) {
            return Err(LedgerError::UnsupportedFormat(path.to_path_buf()));
        }

        info!("reading expense ledger from {}", path.display());
        let reader = BufReader::new(File::open(path)?);
        let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;
        Self::from_lines(lines.iter().map(String::as_str))
    }

    pub fn from_lines<'a, I>(lines: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut totals = IndexMap::new();

        for (index, line) in lines.into_iter().enumerate() {
            debug!("line {}: {line}", index + 1);

            let tokens: Vec<&str> = line.split_whitespace().collect();
            // An entry needs a name, a verb, an amount and at least one trailing token.
            if tokens.len() <= 3 {
                warn!(
                    "skipping line {}: expected at least 4 fields, found {}",
                    index + 1,
                    tokens.len()
                );
                continue;
            }

            let amount = parse_amount(tokens[2]).ok_or_else(|| LedgerError::MalformedAmount {
                token: tokens[2].to_string(),
                line: index + 1,
            })?;
            *totals.entry(tokens[0].to_string()).or_insert(Decimal::ZERO) += amount;
        }

        if totals.is_empty() {
            return Err(LedgerError::EmptyInput);
        }

        let total: Decimal = totals.values().copied().sum();
        info!("parsed {} participants, {total} paid in total", totals.len());
        Ok(Self(totals))
    }
}

// The amount token may carry a currency symbol or thousands separators; only
// digits and the decimal point survive.
fn parse_amount(token: &str) -> Option<Decimal> {
    let digits: String = token
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    Decimal::from_str(&digits).ok()
}
