//! Decode `dx find jobs --show-outputs` text into `Job` records.
//!
//! Layout, per record (records start with `"* "`, anything before the first
//! marker is preamble):
//!
//! ```text
//! * <name tokens...> (<executable>) (<status>) <job-id>
//!   <owner> <YYYY-MM-DD> <HH:MM:SS> (runtime <elapsed>)
//!   Output: <field> = [ <ref>, <ref> ]
//! ```
//!
//! The name is every token before the first parenthesized token. Status is the
//! second parenthesized token, followed by id, owner and date. For done jobs,
//! the token after the third parenthesized token is the runtime. A trailing
//! `More ...` record is the tool's own truncation notice.

use chrono::NaiveDate;

use super::{Job, JobStatus, Runtime};
use crate::error::ParseError;

const RECORD_MARKER: &str = "* ";
const TRUNCATION_PREFIX: &str = "More";
/// Names starting with this are cached/reused jobs and are skipped.
const CACHED_MARKER: char = '[';
const OUTPUT_MARKER: &str = "Output:";
const PLACEHOLDER: &str = "-";

pub const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";
pub const DATE_DISPLAY_FORMAT: &str = "%d/%m/%y";

/// Parse a full listing. Source order is preserved.
///
/// Empty (or whitespace-only) text is `ParseError::EmptySource`, which callers
/// must treat as "unknown owner" rather than "no jobs".
pub fn parse(raw: &str) -> Result<Vec<Job>, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::EmptySource);
    }

    let mut records: Vec<&str> = raw.split(RECORD_MARKER).skip(1).collect();
    if records
        .last()
        .is_some_and(|r| r.starts_with(TRUNCATION_PREFIX))
    {
        records.pop();
    }

    let mut jobs = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        if let Some(job) = parse_record(index, record)? {
            jobs.push(job);
        }
    }
    Ok(jobs)
}

fn malformed(index: usize, reason: impl Into<String>) -> ParseError {
    ParseError::MalformedRecord {
        index,
        reason: reason.into(),
    }
}

fn strip_parens(token: &str) -> &str {
    token.trim_matches(|c| c == '(' || c == ')')
}

fn parse_record(index: usize, record: &str) -> Result<Option<Job>, ParseError> {
    let tokens: Vec<&str> = record.split_whitespace().collect();
    let parens: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.starts_with('('))
        .map(|(i, _)| i)
        .collect();

    let first = *parens
        .first()
        .ok_or_else(|| malformed(index, "no parenthesized field"))?;
    let name = tokens[..first].join(" ");
    if name.starts_with(CACHED_MARKER) {
        tracing::trace!(index, name = %name, "skipping cached job");
        return Ok(None);
    }

    let status_at = *parens
        .get(1)
        .ok_or_else(|| malformed(index, "missing status"))?;
    let field = |offset: usize, what: &str| {
        tokens
            .get(status_at + offset)
            .copied()
            .ok_or_else(|| malformed(index, format!("missing {what}")))
    };

    let status = JobStatus::from_token(strip_parens(tokens[status_at]));
    let id = field(1, "job id")?;
    let owner = field(2, "owner")?;
    let raw_date = field(3, "date")?;
    let submitted = NaiveDate::parse_from_str(raw_date, DATE_INPUT_FORMAT)
        .map_err(|source| ParseError::InvalidDate {
            index,
            value: raw_date.to_string(),
            source,
        })?
        .format(DATE_DISPLAY_FORMAT)
        .to_string();

    let (runtime, outputs) = if status == JobStatus::Done {
        done_details(index, &tokens, &parens)?
    } else {
        (Runtime::Unset, Vec::new())
    };

    Ok(Some(Job {
        id: id.to_string(),
        name,
        status,
        owner: owner.to_string(),
        submitted,
        runtime,
        outputs,
    }))
}

/// Runtime and output refs of a done job. Both stay unset when the record has
/// no `Output:` marker or its value is the `-` placeholder.
fn done_details(
    index: usize,
    tokens: &[&str],
    parens: &[usize],
) -> Result<(Runtime, Vec<String>), ParseError> {
    let Some(marker) = tokens.iter().position(|t| *t == OUTPUT_MARKER) else {
        return Ok((Runtime::Unset, Vec::new()));
    };
    match tokens.get(marker + 1) {
        None => return Ok((Runtime::Unset, Vec::new())),
        Some(t) if *t == PLACEHOLDER => return Ok((Runtime::Unset, Vec::new())),
        Some(_) => {}
    }

    let runtime = parens
        .get(2)
        .and_then(|p| tokens.get(p + 1))
        .map(|t| Runtime::Elapsed(strip_parens(t).to_string()))
        .ok_or_else(|| malformed(index, "missing runtime"))?;

    let open = tokens[marker..]
        .iter()
        .position(|t| *t == "[")
        .map(|p| marker + p)
        .ok_or_else(|| malformed(index, "output list has no opening bracket"))?;
    let close = tokens[open..]
        .iter()
        .position(|t| *t == "]")
        .map(|p| open + p)
        .ok_or_else(|| malformed(index, "output list has no closing bracket"))?;

    let outputs = tokens[open + 1..close]
        .concat()
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    Ok((runtime, outputs))
}
