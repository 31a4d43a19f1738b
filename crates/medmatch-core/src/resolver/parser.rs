//! Medicine name parser.
//!
//! Splits a raw name such as `"Paracetamol_500mg (1 box x 6 tablets)"` into a
//! base name (`"Paracetamol"`) and a dosage (`"500mg"`).
//!
//! Dosages are found by a small tokenizer rather than one composite regex:
//!
//! ```text
//! token   := segment (combinator segment)*
//! segment := value ws? unit
//! value   := digit+ ([.,] digit+)?
//! unit    := mcg | mg | ml | iu | ui | g | l | %      (case-insensitive, not followed by a letter)
//! combinator := ws* [+/]? ws*                         (at least one character)
//! ```

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::ParsedName;

lazy_static! {
    /// "(1 box x 10 tablets)", "(1 hộp x 10 vỉ x 10 viên)", "(1 chai x )".
    static ref PACKAGING_ANNOTATION: Regex =
        Regex::new(r"(?i)\(\s*\d+(?:[.,]\d+)?\s*[^\s\d()]+\s*[x×*][^)]*\)")
            .expect("packaging annotation pattern is valid");
    static ref EMPTY_PARENS: Regex = Regex::new(r"\(\s*\)").expect("empty parens pattern is valid");
}

/// Dosage unit as written, before any conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoseUnit {
    Mcg,
    Mg,
    G,
    Ml,
    L,
    Iu,
    Percent,
}

impl DoseUnit {
    /// Longest spellings first so "mcg" wins over "mg" and "ml" over "l".
    const SPELLINGS: [(&'static str, DoseUnit); 8] = [
        ("mcg", DoseUnit::Mcg),
        ("mg", DoseUnit::Mg),
        ("ml", DoseUnit::Ml),
        ("iu", DoseUnit::Iu),
        ("ui", DoseUnit::Iu),
        ("g", DoseUnit::G),
        ("l", DoseUnit::L),
        ("%", DoseUnit::Percent),
    ];
}

/// One `value unit` pair, e.g. `500mg` or `2.5 g`.
#[derive(Debug, Clone, PartialEq)]
pub struct DoseSegment {
    pub value: f64,
    pub unit: DoseUnit,
    /// Segment text exactly as it appears in the input
    pub text: String,
}

/// A chain of segments joined by `+`, `/` or whitespace, e.g. `2500mg+500mg`.
#[derive(Debug, Clone, PartialEq)]
pub struct DosageToken {
    pub segments: Vec<DoseSegment>,
    /// Token text exactly as it appears in the input
    pub text: String,
}

impl DosageToken {
    /// Segments joined with the canonical `/` combinator.
    pub fn canonical(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Find every dosage token in `input`, left to right.
pub fn scan_dosage_tokens(input: &str) -> Vec<DosageToken> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let Some((first, mut end)) = scan_segment(input, &chars, i) else {
            i += 1;
            continue;
        };

        let start = i;
        let mut segments = vec![first];
        while let Some(next_start) = skip_combinator(&chars, end) {
            match scan_segment(input, &chars, next_start) {
                Some((segment, next_end)) => {
                    segments.push(segment);
                    end = next_end;
                }
                None => break,
            }
        }

        tokens.push(DosageToken {
            segments,
            text: slice(input, &chars, start, end).to_string(),
        });
        i = end;
    }

    tokens
}

/// First `value unit` segment anywhere in `input`.
pub fn first_segment(input: &str) -> Option<DoseSegment> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    (0..chars.len()).find_map(|i| scan_segment(input, &chars, i).map(|(segment, _)| segment))
}

/// Split a raw medicine name into base name and dosage. Never fails.
pub fn parse_medicine_name(raw: &str) -> ParsedName {
    let tokens = scan_dosage_tokens(raw);

    if tokens.is_empty() {
        return ParsedName {
            base_name: collapse_whitespace(&raw.replace('_', " ")),
            dosage: None,
        };
    }

    let mut name = collapse_whitespace(&raw.replace(['_', '+'], " "));
    for token in &tokens {
        name = remove_token(&name, &token.text);
    }

    let name = PACKAGING_ANNOTATION.replace_all(&name, " ");
    let name = EMPTY_PARENS.replace_all(&name, " ");
    let base_name = collapse_whitespace(&name.replace(['_', '-', '/', '+'], " "));

    let dosage = tokens
        .iter()
        .map(DosageToken::canonical)
        .collect::<Vec<_>>()
        .join("/");

    ParsedName {
        base_name: if base_name.is_empty() {
            raw.to_string()
        } else {
            base_name
        },
        dosage: Some(dosage),
    }
}

/// Remove the first occurrence of a dosage token from `name`.
///
/// Tries the token as matched, then with its separators turned into spaces,
/// then with all separators dropped, since the name has been re-spaced since
/// the token was found.
fn remove_token(name: &str, token: &str) -> String {
    let spaced = collapse_whitespace(&token.replace(['_', '+'], " "));
    let compact: String = token
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '_' | '+' | '/'))
        .collect();

    for variant in [token, spaced.as_str(), compact.as_str()] {
        if !variant.is_empty() && name.contains(variant) {
            return name.replacen(variant, " ", 1);
        }
    }
    name.to_string()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn slice<'a>(input: &'a str, chars: &[(usize, char)], start: usize, end: usize) -> &'a str {
    let from = chars[start].0;
    let to = chars.get(end).map_or(input.len(), |(offset, _)| *offset);
    &input[from..to]
}

fn is_inline_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Parse `value ws? unit` starting exactly at char index `i`.
fn scan_segment(input: &str, chars: &[(usize, char)], i: usize) -> Option<(DoseSegment, usize)> {
    if !chars.get(i)?.1.is_ascii_digit() {
        return None;
    }
    // Must start a number, not continue one.
    if i > 0 && matches!(chars[i - 1].1, '0'..='9' | '.' | ',') {
        return None;
    }

    let mut j = i;
    while j < chars.len() && chars[j].1.is_ascii_digit() {
        j += 1;
    }
    if j + 1 < chars.len() && matches!(chars[j].1, '.' | ',') && chars[j + 1].1.is_ascii_digit() {
        j += 1;
        while j < chars.len() && chars[j].1.is_ascii_digit() {
            j += 1;
        }
    }
    let value: f64 = slice(input, chars, i, j).replace(',', ".").parse().ok()?;

    let mut k = j;
    while k < chars.len() && is_inline_space(chars[k].1) {
        k += 1;
    }

    let (unit, unit_len) = match_unit(chars, k)?;
    let end = k + unit_len;

    Some((
        DoseSegment {
            value,
            unit,
            text: slice(input, chars, i, end).to_string(),
        },
        end,
    ))
}

fn match_unit(chars: &[(usize, char)], k: usize) -> Option<(DoseUnit, usize)> {
    DoseUnit::SPELLINGS.iter().find_map(|(spelling, unit)| {
        let len = spelling.chars().count();
        if k + len > chars.len() {
            return None;
        }
        let matches = chars[k..k + len]
            .iter()
            .zip(spelling.chars())
            .all(|((_, c), s)| c.to_ascii_lowercase() == s);
        let bounded = chars.get(k + len).map_or(true, |(_, c)| !c.is_alphabetic());
        (matches && bounded).then_some((*unit, len))
    })
}

/// Position of the next segment after a combinator, if there is a combinator.
fn skip_combinator(chars: &[(usize, char)], end: usize) -> Option<usize> {
    let mut k = end;
    while k < chars.len() && is_inline_space(chars[k].1) {
        k += 1;
    }
    if k < chars.len() && matches!(chars[k].1, '+' | '/') {
        k += 1;
        while k < chars.len() && is_inline_space(chars[k].1) {
            k += 1;
        }
    }
    (k > end && k < chars.len()).then_some(k)
}
