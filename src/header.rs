//! HEAD file parsing
//!
//! A HEAD file is a sequence of attribute chunks:
//!
//! ```text
//! type = integer-attribute
//! name = DATASET_RANK
//! count = 8
//!      3     1     0     0     0     0     0     0
//!
//! type = string-attribute
//! name = TYPESTRING
//! count = 15
//! '3DIM_HEAD_ANAT~
//! ```
//!
//! Chunks are consumed strictly in order: the next chunk header is searched
//! for only after the previous value region has been fully consumed, since
//! string values may themselves contain text that looks like a chunk header.

use crate::error::{BrikError, Result};
use crate::lexer::Cursor;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::slice;

/// Separator AFNI uses inside multi-valued string attributes such as `BRICK_LABS`
pub const STRING_SEPARATOR: char = '~';

/// Declared type of an attribute chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AttributeKind {
    Integer,
    Float,
    String,
}

impl AttributeKind {
    /// Parse the keyword that precedes `-attribute`
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "integer" => Some(AttributeKind::Integer),
            "float" => Some(AttributeKind::Float),
            "string" => Some(AttributeKind::String),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            AttributeKind::Integer => "integer",
            AttributeKind::Float => "float",
            AttributeKind::String => "string",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Value of a single attribute
///
/// Numeric attributes with `count == 1` are scalars, everything else is a
/// sequence. The typed accessors expose both shapes as slices and fail on a
/// kind mismatch instead of converting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    IntegerScalar(i64),
    IntegerSequence(Vec<i64>),
    FloatScalar(f64),
    FloatSequence(Vec<f64>),
    Text(String),
}

impl AttributeValue {
    fn from_integers(mut values: Vec<i64>) -> Self {
        if values.len() == 1 {
            AttributeValue::IntegerScalar(values.remove(0))
        } else {
            AttributeValue::IntegerSequence(values)
        }
    }

    fn from_floats(mut values: Vec<f64>) -> Self {
        if values.len() == 1 {
            AttributeValue::FloatScalar(values.remove(0))
        } else {
            AttributeValue::FloatSequence(values)
        }
    }

    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::IntegerScalar(_) | AttributeValue::IntegerSequence(_) => {
                AttributeKind::Integer
            }
            AttributeValue::FloatScalar(_) | AttributeValue::FloatSequence(_) => {
                AttributeKind::Float
            }
            AttributeValue::Text(_) => AttributeKind::String,
        }
    }

    /// Declared count as it appears in the HEAD file
    ///
    /// For text this includes the sentinel character that is not stored.
    pub fn count(&self) -> usize {
        match self {
            AttributeValue::IntegerScalar(_) | AttributeValue::FloatScalar(_) => 1,
            AttributeValue::IntegerSequence(v) => v.len(),
            AttributeValue::FloatSequence(v) => v.len(),
            AttributeValue::Text(s) => s.chars().count() + 1,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            AttributeValue::IntegerScalar(_) | AttributeValue::FloatScalar(_)
        )
    }

    pub fn as_integers(&self) -> Option<&[i64]> {
        match self {
            AttributeValue::IntegerScalar(v) => Some(slice::from_ref(v)),
            AttributeValue::IntegerSequence(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            AttributeValue::FloatScalar(v) => Some(slice::from_ref(v)),
            AttributeValue::FloatSequence(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer values of attribute `name`, failing if it is not an integer attribute
    pub fn integers(&self, name: &str) -> Result<&[i64]> {
        self.as_integers()
            .ok_or_else(|| self.mismatch(name, AttributeKind::Integer))
    }

    /// Float values of attribute `name`, failing if it is not a float attribute
    pub fn floats(&self, name: &str) -> Result<&[f64]> {
        self.as_floats()
            .ok_or_else(|| self.mismatch(name, AttributeKind::Float))
    }

    /// Text of attribute `name`, failing if it is not a string attribute
    pub fn text(&self, name: &str) -> Result<&str> {
        self.as_text()
            .ok_or_else(|| self.mismatch(name, AttributeKind::String))
    }

    fn mismatch(&self, name: &str, expected: AttributeKind) -> BrikError {
        BrikError::AttributeTypeMismatch {
            name: name.to_string(),
            expected: expected.keyword(),
            found: self.kind().keyword(),
        }
    }
}

/// One parsed attribute chunk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn kind(&self) -> AttributeKind {
        self.value.kind()
    }

    pub fn count(&self) -> usize {
        self.value.count()
    }
}

/// Parsed HEAD contents: attribute name to value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Header {
    attributes: HashMap<String, AttributeValue>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a header from parsed attributes; a repeated name keeps its last value
    pub fn from_attributes(attributes: impl IntoIterator<Item = Attribute>) -> Self {
        let mut header = Self::new();
        for attribute in attributes {
            header.insert(attribute.name, attribute.value);
        }
        header
    }

    pub fn insert(&mut self, name: impl Into<String>, value: AttributeValue) {
        let name = name.into();
        if let Some(previous) = self.attributes.insert(name.clone(), value) {
            tracing::warn!(
                attribute = %name,
                previous_kind = %previous.kind(),
                "duplicate attribute, keeping the later value"
            );
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn require(&self, name: &str) -> Result<&AttributeValue> {
        self.get(name)
            .ok_or_else(|| BrikError::MissingRequiredAttribute(name.to_string()))
    }

    /// Integer values of a required attribute
    pub fn integers(&self, name: &str) -> Result<&[i64]> {
        self.require(name)?.integers(name)
    }

    /// Float values of a required attribute
    pub fn floats(&self, name: &str) -> Result<&[f64]> {
        self.require(name)?.floats(name)
    }

    /// Text of a required attribute
    pub fn text(&self, name: &str) -> Result<&str> {
        self.require(name)?.text(name)
    }

    /// Sub-brick labels from `BRICK_LABS`, if present
    pub fn brick_labels(&self) -> Result<Option<Vec<&str>>> {
        let Some(value) = self.get("BRICK_LABS") else {
            return Ok(None);
        };
        let text = value.text("BRICK_LABS")?;
        let mut labels: Vec<&str> = text.split(STRING_SEPARATOR).collect();
        if labels.last() == Some(&"") {
            labels.pop();
        }
        Ok(Some(labels))
    }

    /// Pretty-printed JSON rendering of all attributes
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parse HEAD text into a [`Header`]
pub fn parse_header(text: &str) -> Result<Header> {
    let attributes = parse_attributes(text)?;
    tracing::debug!(attributes = attributes.len(), "parsed HEAD text");
    Ok(Header::from_attributes(attributes))
}

/// Parse HEAD text into its attribute chunks, in file order
pub fn parse_attributes(text: &str) -> Result<Vec<Attribute>> {
    let mut attributes = Vec::new();
    let mut cursor = Cursor::new(text);

    while let Some((attribute, next)) = parse_chunk(cursor)? {
        tracing::trace!(
            name = %attribute.name,
            kind = %attribute.kind(),
            count = attribute.count(),
            "attribute"
        );
        attributes.push(attribute);
        cursor = next;
    }

    Ok(attributes)
}

/// Declared fields of a chunk header
struct ChunkHeader<'a> {
    kind: &'a str,
    name: &'a str,
    count: usize,
}

/// Parse the next chunk at or after `cursor`
///
/// Returns `None` once no further chunk header exists; trailing text is ignored.
pub fn parse_chunk(cursor: Cursor<'_>) -> Result<Option<(Attribute, Cursor<'_>)>> {
    let Some((chunk, body)) = next_chunk_header(cursor)? else {
        return Ok(None);
    };

    let kind = AttributeKind::from_keyword(chunk.kind).ok_or_else(|| {
        BrikError::UnsupportedAttributeType {
            name: chunk.name.to_string(),
            kind: chunk.kind.to_string(),
        }
    })?;

    let (value, next) = match kind {
        AttributeKind::Integer => {
            let (values, next) = numeric_values(body, &chunk, parse_integer)?;
            (AttributeValue::from_integers(values), next)
        }
        AttributeKind::Float => {
            let (values, next) = numeric_values(body, &chunk, parse_float)?;
            (AttributeValue::from_floats(values), next)
        }
        AttributeKind::String => {
            let (text, next) = string_value(body, &chunk)?;
            (AttributeValue::Text(text.to_string()), next)
        }
    };

    let attribute = Attribute {
        name: chunk.name.to_string(),
        value,
    };
    Ok(Some((attribute, next)))
}

/// Find the next `type = <kind>-attribute name = <id> count = <n>` header
///
/// Text that only partly matches a chunk header is skipped, so prose such as
/// `datatype = short` after the last chunk is ignored. A complete header whose
/// count does not fit in `usize` is a `ParseStructure` error.
fn next_chunk_header(mut cursor: Cursor<'_>) -> Result<Option<(ChunkHeader<'_>, Cursor<'_>)>> {
    loop {
        let Some(start) = cursor.find("type") else {
            return Ok(None);
        };
        if let Some(found) = chunk_header_at(start)? {
            return Ok(Some(found));
        }
        match start.bump() {
            Some(next) => cursor = next,
            None => return Ok(None),
        }
    }
}

fn chunk_header_at(cursor: Cursor<'_>) -> Result<Option<(ChunkHeader<'_>, Cursor<'_>)>> {
    let Some(fields) = chunk_header_fields(cursor) else {
        return Ok(None);
    };
    let (kind, name, digits, count_at, body) = fields;
    let count = digits
        .parse::<usize>()
        .map_err(|_| structure_error(count_at, "attribute count out of range"))?;
    Ok(Some((ChunkHeader { kind, name, count }, body)))
}

type HeaderFields<'a> = (&'a str, &'a str, &'a str, Cursor<'a>, Cursor<'a>);

fn chunk_header_fields(cursor: Cursor<'_>) -> Option<HeaderFields<'_>> {
    let c = cursor.literal("type")?.skip_whitespace().literal("=")?;
    let (kind, c) = c.skip_whitespace().identifier()?;
    let c = c.literal("-attribute")?;
    let c = c.skip_whitespace().literal("name")?;
    let c = c.skip_whitespace().literal("=")?;
    let (name, c) = c.skip_whitespace().identifier()?;
    let c = c.skip_whitespace().literal("count")?;
    let c = c.skip_whitespace().literal("=")?.skip_whitespace();
    let (digits, body) = c.digits()?;
    Some((kind, name, digits, c, body))
}

fn structure_error(cursor: Cursor<'_>, reason: &str) -> BrikError {
    BrikError::ParseStructure {
        offset: cursor.offset(),
        reason: reason.to_string(),
    }
}

/// Read exactly `count` whitespace separated tokens with `parse`
fn numeric_values<'a, T>(
    mut cursor: Cursor<'a>,
    chunk: &ChunkHeader<'_>,
    parse: fn(&str) -> Option<T>,
) -> Result<(Vec<T>, Cursor<'a>)> {
    // The declared count is untrusted; each value needs at least two bytes.
    let mut values = Vec::with_capacity(chunk.count.min(cursor.rest().len() / 2 + 1));
    while values.len() < chunk.count {
        let parsed = cursor
            .skip_whitespace()
            .token()
            .and_then(|(token, next)| parse(token).map(|v| (v, next)));
        let Some((value, next)) = parsed else {
            return Err(BrikError::ValueCountMismatch {
                name: chunk.name.to_string(),
                expected: chunk.count,
                found: values.len(),
            });
        };
        values.push(value);
        cursor = next;
    }
    Ok((values, cursor))
}

/// `'` followed by `count - 1` characters and the `~` sentinel
fn string_value<'a>(cursor: Cursor<'a>, chunk: &ChunkHeader<'_>) -> Result<(&'a str, Cursor<'a>)> {
    let mismatch = |found: usize| BrikError::ValueCountMismatch {
        name: chunk.name.to_string(),
        expected: chunk.count.saturating_sub(1),
        found,
    };

    let body = cursor
        .skip_whitespace()
        .literal("'")
        .ok_or_else(|| mismatch(0))?;
    let before_sentinel = || {
        body.rest()
            .chars()
            .take_while(|&c| c != STRING_SEPARATOR)
            .count()
    };

    let length = chunk
        .count
        .checked_sub(1)
        .ok_or_else(|| mismatch(before_sentinel()))?;
    let (text, end) = body.chars(length).ok_or_else(|| mismatch(before_sentinel()))?;
    let next = end
        .literal("~")
        .ok_or_else(|| mismatch(before_sentinel()))?;

    Ok((text, next))
}

/// `[+-]?[0-9]+`
fn parse_integer(token: &str) -> Option<i64> {
    let digits = token.strip_prefix(&['+', '-'][..]).unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// `[+-]?(\d+([.,]\d*)?|[.,]\d+)([eE][+-]?\d+)?`, accepting `,` as decimal separator
fn parse_float(token: &str) -> Option<f64> {
    let bytes = token.as_bytes();
    let mut i = 0;
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_end = digits_from(i);
    let has_int = int_end > i;
    i = int_end;

    if matches!(bytes.get(i), Some(b'.' | b',')) {
        let frac_end = digits_from(i + 1);
        if !has_int && frac_end == i + 1 {
            return None;
        }
        i = frac_end;
    } else if !has_int {
        return None;
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_end = digits_from(j);
        if exp_end == j {
            return None;
        }
        i = exp_end;
    }

    if i != bytes.len() {
        return None;
    }
    token.replace(',', ".").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
type = string-attribute
name = TYPESTRING
count = 15
'3DIM_HEAD_ANAT~

type = integer-attribute
name = DATASET_RANK
count = 8
     3     1     0     0     0     0     0     0

type = integer-attribute
name = DATASET_DIMENSIONS
count = 5
    64    64    32     0     0

type = float-attribute
name = BRICK_FLOAT_FACS
count = 1
 0.5

type = integer-attribute
name = BRICK_TYPES
count = 1
 1
";

    #[test]
    fn test_parse_sample_header() {
        let header = parse_header(SAMPLE).unwrap();
        assert_eq!(header.len(), 5);
        assert_eq!(header.text("TYPESTRING").unwrap(), "3DIM_HEAD_ANAT");
        assert_eq!(header.integers("DATASET_RANK").unwrap(), &[3, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(header.integers("DATASET_DIMENSIONS").unwrap()[..3], [64, 64, 32]);
        assert_eq!(
            header.get("BRICK_FLOAT_FACS"),
            Some(&AttributeValue::FloatScalar(0.5))
        );
        assert_eq!(header.get("BRICK_TYPES"), Some(&AttributeValue::IntegerScalar(1)));
    }

    #[test]
    fn test_attributes_keep_file_order_and_count() {
        let attributes = parse_attributes(SAMPLE).unwrap();
        let names: Vec<_> = attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            ["TYPESTRING", "DATASET_RANK", "DATASET_DIMENSIONS", "BRICK_FLOAT_FACS", "BRICK_TYPES"]
        );
        assert_eq!(attributes[0].count(), 15);
        assert_eq!(attributes[0].kind(), AttributeKind::String);
        assert_eq!(attributes[1].count(), 8);
    }

    #[test]
    fn test_string_drops_sentinel() {
        let text = "type = string-attribute\nname = LABEL\ncount = 5\n'abcd~";
        let header = parse_header(text).unwrap();
        assert_eq!(header.text("LABEL").unwrap(), "abcd");
    }

    #[test]
    fn test_string_may_contain_line_breaks_and_chunk_lookalikes() {
        let body = "x\ntype = integer-attribute name = FAKE count = 1 7";
        let text = format!(
            "type = string-attribute\nname = HISTORY_NOTE\ncount = {}\n'{}~\n\
             type = integer-attribute\nname = REAL\ncount = 1\n 3\n",
            body.chars().count() + 1,
            body
        );
        let header = parse_header(&text).unwrap();
        assert_eq!(header.text("HISTORY_NOTE").unwrap(), body);
        assert!(!header.contains("FAKE"));
        assert_eq!(header.integers("REAL").unwrap(), &[3]);
    }

    #[test]
    fn test_extra_token_is_not_absorbed() {
        let text = "type = integer-attribute\nname = A\ncount = 2\n 1 2 3\n";
        let header = parse_header(text).unwrap();
        assert_eq!(header.integers("A").unwrap(), &[1, 2]);
    }

    #[test]
    fn test_too_few_values_names_attribute() {
        let text = "type = integer-attribute\nname = DATASET_RANK\ncount = 3\n 1 2\n";
        match parse_header(text) {
            Err(BrikError::ValueCountMismatch { name, expected, found }) => {
                assert_eq!(name, "DATASET_RANK");
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_integer_token() {
        let text = "type = integer-attribute\nname = A\ncount = 2\n 1 2.5\n";
        assert!(matches!(
            parse_header(text),
            Err(BrikError::ValueCountMismatch { found: 1, .. })
        ));
    }

    #[test]
    fn test_string_length_mismatch() {
        let text = "type = string-attribute\nname = S\ncount = 6\n'abcd~";
        match parse_header(text) {
            Err(BrikError::ValueCountMismatch { name, expected, found }) => {
                assert_eq!(name, "S");
                assert_eq!(expected, 5);
                assert_eq!(found, 4);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let text = "type = string-attribute\nname = S\ncount = 0\n'~";
        assert!(matches!(
            parse_header(text),
            Err(BrikError::ValueCountMismatch { .. })
        ));
    }

    #[test]
    fn test_float_tokens() {
        let text = "type = float-attribute\nname = F\ncount = 6\n1 -2.5 3,25 .5 1e3 +4.E-1\n";
        let header = parse_header(text).unwrap();
        assert_eq!(header.floats("F").unwrap(), &[1.0, -2.5, 3.25, 0.5, 1000.0, 0.4]);

        assert_eq!(parse_float("."), None);
        assert_eq!(parse_float("1e"), None);
        assert_eq!(parse_float("nan"), None);
        assert_eq!(parse_float("1.2.3"), None);
    }

    #[test]
    fn test_unsupported_kind() {
        let text = "type = complex-attribute\nname = Z\ncount = 1\n 1\n";
        match parse_header(text) {
            Err(BrikError::UnsupportedAttributeType { name, kind }) => {
                assert_eq!(name, "Z");
                assert_eq!(kind, "complex");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_incomplete_chunk_header_is_skipped() {
        let text = "type = integer-attribute\ncount = 1\n 1\n";
        assert!(parse_header(text).unwrap().is_empty());

        let text = "type = integer-attribute\nname = A\ncount = 1\n 4\nnote: datatype = short\n";
        let header = parse_header(text).unwrap();
        assert_eq!(header.len(), 1);
        assert_eq!(header.integers("A").unwrap(), &[4]);
    }

    #[test]
    fn test_count_out_of_range() {
        let text = "type = integer-attribute\nname = A\ncount = 99999999999999999999999\n 1\n";
        assert!(matches!(
            parse_header(text),
            Err(BrikError::ParseStructure { .. })
        ));
    }

    #[test]
    fn test_huge_count_is_a_count_mismatch() {
        let text = "type = integer-attribute\nname = A\ncount = 2305843009213693952\n 1 2\n";
        match parse_header(text) {
            Err(BrikError::ValueCountMismatch { name, expected, found }) => {
                assert_eq!(name, "A");
                assert_eq!(expected, 2305843009213693952);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_and_trailing_text() {
        assert!(parse_header("").unwrap().is_empty());
        assert!(parse_header("no chunks, typewriter\n").unwrap().is_empty());

        let text = "type = integer-attribute\nname = A\ncount = 1\n 4\ntrailing junk";
        assert_eq!(parse_header(text).unwrap().len(), 1);
    }

    #[test]
    fn test_zero_count_numeric_is_empty_sequence() {
        let text = "type = float-attribute\nname = EMPTY\ncount = 0\n";
        let header = parse_header(text).unwrap();
        assert_eq!(header.floats("EMPTY").unwrap(), &[] as &[f64]);
    }

    #[test]
    fn test_accessors_reject_wrong_kind() {
        let header = parse_header(SAMPLE).unwrap();
        assert!(matches!(
            header.floats("BRICK_TYPES"),
            Err(BrikError::AttributeTypeMismatch { expected: "float", found: "integer", .. })
        ));
        assert!(matches!(
            header.integers("NOPE"),
            Err(BrikError::MissingRequiredAttribute(name)) if name == "NOPE"
        ));
    }

    #[test]
    fn test_brick_labels() {
        let text = "type = string-attribute\nname = BRICK_LABS\ncount = 8\n'#0~Fout~";
        let header = parse_header(text).unwrap();
        assert_eq!(header.brick_labels().unwrap(), Some(vec!["#0", "Fout"]));
        assert_eq!(Header::new().brick_labels().unwrap(), None);
    }

    #[test]
    fn test_duplicate_keeps_last() {
        let text = "type = integer-attribute\nname = A\ncount = 1\n 1\n\
                    type = integer-attribute\nname = A\ncount = 1\n 2\n";
        assert_eq!(parse_header(text).unwrap().integers("A").unwrap(), &[2]);
    }

    #[test]
    fn test_to_json() {
        let header = parse_header(SAMPLE).unwrap();
        let value: serde_json::Value = serde_json::from_str(&header.to_json().unwrap()).unwrap();
        assert_eq!(value["TYPESTRING"], "3DIM_HEAD_ANAT");
        assert_eq!(value["BRICK_TYPES"], 1);
        assert_eq!(value["DATASET_DIMENSIONS"][1], 64);
    }
}
