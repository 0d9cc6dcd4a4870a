//! Text form of posting lists.
//!
//! Every index line is `termId:df<TAB>(code,freq);(code,freq);...` where
//! `code` is a doc id, a decimal gap, a hex variable-byte code or a gamma
//! bit string depending on the file.

use std::fmt::Display;

use crate::codec::gap::GapPosting;
use crate::codec::{gamma, vbyte};
use crate::error::{IndexError, Result};
use crate::index::types::{Posting, TermId};

/// Concatenate `(code,frequency);` pairs
pub fn format_pairs<C, F, I>(pairs: I) -> String
where
    C: Display,
    F: Display,
    I: IntoIterator<Item = (C, F)>,
{
    let mut out = String::new();
    for (code, frequency) in pairs {
        out.push('(');
        out.push_str(&code.to_string());
        out.push(',');
        out.push_str(&frequency.to_string());
        out.push_str(");");
    }
    out
}

/// Split a pair list into `(code, frequency)` with the code left unparsed
pub fn parse_pairs(body: &str) -> Result<Vec<(&str, u32)>> {
    let mut pairs = Vec::new();
    let mut rest = body;

    while !rest.is_empty() {
        let end = rest.find(';').ok_or_else(|| {
            IndexError::MalformedPostings(format!("unterminated posting '{}'", rest))
        })?;
        let pair = &rest[..end];
        rest = &rest[end + 1..];

        let inner = pair
            .strip_prefix('(')
            .and_then(|p| p.strip_suffix(')'))
            .ok_or_else(|| IndexError::MalformedPostings(format!("bad posting '{}'", pair)))?;
        let (code, frequency) = inner
            .split_once(',')
            .ok_or_else(|| IndexError::MalformedPostings(format!("bad posting '{}'", pair)))?;
        let frequency = frequency.parse::<u32>().map_err(|_| {
            IndexError::MalformedPostings(format!("bad frequency in '{}'", pair))
        })?;
        if code.is_empty() {
            return Err(IndexError::MalformedPostings(format!("empty code in '{}'", pair)));
        }
        pairs.push((code, frequency));
    }

    Ok(pairs)
}

/// Parse a pair list whose codes are decimal integers (doc ids or gaps)
pub fn parse_decimal_pairs(body: &str) -> Result<Vec<(u32, u32)>> {
    parse_pairs(body)?
        .into_iter()
        .map(|(code, frequency)| {
            code.parse::<u32>()
                .map(|value| (value, frequency))
                .map_err(|_| IndexError::MalformedPostings(format!("bad number '{}'", code)))
        })
        .collect()
}

/// Parse `(docId,freq);...` into postings
pub fn parse_postings(body: &str) -> Result<Vec<Posting>> {
    Ok(parse_decimal_pairs(body)?
        .into_iter()
        .map(|(doc_id, frequency)| Posting::new(doc_id, frequency))
        .collect())
}

pub fn format_postings(postings: &[Posting]) -> String {
    format_pairs(postings.iter().map(|p| (p.doc_id, p.frequency)))
}

/// `(gap,freq);...` with decimal gaps
pub fn format_gap_pairs(gaps: &[GapPosting]) -> String {
    format_pairs(gaps.iter().map(|g| (g.gap, g.frequency)))
}

pub fn parse_gap_pairs(body: &str) -> Result<Vec<GapPosting>> {
    Ok(parse_decimal_pairs(body)?
        .into_iter()
        .map(|(gap, frequency)| GapPosting::new(gap, frequency))
        .collect())
}

/// `(code,freq);...` with each gap's variable-byte code in hex
pub fn format_vbyte_pairs(gaps: &[GapPosting]) -> String {
    let mut code = Vec::with_capacity(5);
    format_pairs(gaps.iter().map(|g| {
        code.clear();
        vbyte::encode(g.gap, &mut code);
        (vbyte::to_hex(&code), g.frequency)
    }))
}

pub fn parse_vbyte_pairs(body: &str) -> Result<Vec<GapPosting>> {
    parse_pairs(body)?
        .into_iter()
        .map(|(code, frequency)| {
            let bytes = vbyte::from_hex(code)?;
            let (gap, consumed) = vbyte::decode(&bytes)?;
            if consumed != bytes.len() {
                return Err(IndexError::MalformedCode(format!(
                    "trailing bytes after variable-byte code '{}'",
                    code
                )));
            }
            Ok(GapPosting::new(gap, frequency))
        })
        .collect()
}

/// `(code,freq);...` with each gap's gamma code as a bit string.
/// Gaps are shifted as described in [`gamma::shift_first_gap`].
pub fn format_gamma_pairs(gaps: &[GapPosting]) -> Result<String> {
    let values: Vec<u32> = gaps.iter().map(|g| g.gap).collect();
    let shifted = gamma::shift_first_gap(&values)?;
    let codes = shifted
        .into_iter()
        .map(gamma::to_bit_string)
        .collect::<Result<Vec<_>>>()?;
    Ok(format_pairs(
        codes.into_iter().zip(gaps.iter().map(|g| g.frequency)),
    ))
}

pub fn parse_gamma_pairs(body: &str) -> Result<Vec<GapPosting>> {
    let pairs = parse_pairs(body)?;
    let mut values = pairs
        .iter()
        .map(|(code, _)| gamma::from_bit_string(code))
        .collect::<Result<Vec<_>>>()?;
    gamma::unshift_first_gap(&mut values)?;
    Ok(values
        .into_iter()
        .zip(pairs.iter().map(|&(_, frequency)| frequency))
        .map(|(gap, frequency)| GapPosting::new(gap, frequency))
        .collect())
}

/// Build one index line, newline included
pub fn format_line(term_id: TermId, df: usize, body: &str) -> String {
    format!("{}:{}\t{}\n", term_id, df, body)
}

/// Split an index line (without its newline) into term id, df and body
pub fn parse_line(line: &str) -> Result<(TermId, usize, &str)> {
    let bad = || IndexError::MalformedPostings(format!("bad index line '{}'", line));

    let (head, body) = line.split_once('\t').ok_or_else(bad)?;
    let (term, df) = head.split_once(':').ok_or_else(bad)?;
    let term_id = term.parse::<TermId>().map_err(|_| bad())?;
    let df = df.parse::<usize>().map_err(|_| bad())?;
    Ok((term_id, df, body))
}
