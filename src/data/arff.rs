//! ARFF format dataset parser
//!
//! Supports the header/data layout of the Attribute-Relation File Format:
//!
//! ```text
//! @relation weather
//! @attribute temperature numeric
//! @attribute outlook {sunny, rainy}
//! @attribute class {yes, no}
//! @data
//! 21.5, sunny, yes
//! ?, rainy, no
//! ```
//!
//! Data rows are either dense (positional, comma separated) or sparse
//! (`{index value, index value}`). The format is decided once by peeking at the
//! first data row; every following row must use the same representation.
//! Columns omitted from a sparse row take the column's zero value.

use crate::core::{AttributeDescriptor, AttributeKind, Cell, Result, RunnerError};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, ErrorKind};
use std::iter::Peekable;
use std::path::Path;
use std::str::{Chars, FromStr};

/// Representation used by the data section of an ARFF file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataFormat {
    Dense,
    Sparse,
}

impl DataFormat {
    /// Decide the representation from the first data row
    pub fn detect(line: &str) -> Self {
        let line = line.trim_start();
        if line.starts_with('{') && line.contains('}') {
            DataFormat::Sparse
        } else {
            DataFormat::Dense
        }
    }
}

/// One data row, tagged with its representation
#[derive(Clone, Debug, PartialEq)]
pub enum RawRow {
    /// One cell per declared attribute
    Dense(Vec<Cell>),
    /// `(column, cell)` pairs sorted by column
    Sparse(Vec<(usize, Cell)>),
}

/// Parsed ARFF table
#[derive(Clone, Debug, PartialEq)]
pub struct RawTable {
    relation: String,
    attributes: Vec<AttributeDescriptor>,
    defaults: Vec<Cell>,
    format: DataFormat,
    rows: Vec<RawRow>,
}

/// A value token, remembering whether it was quoted (`'?'` is not missing)
#[derive(Debug, PartialEq)]
struct Field {
    value: String,
    quoted: bool,
}

enum HeaderLine {
    Relation(String),
    Attribute(AttributeDescriptor),
    Data,
}

impl RawTable {
    /// Load a table from an ARFF file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(RunnerError::Io)?;
        let reader = BufReader::new(file);
        Self::from_reader(reader)
    }

    /// Load a table from a reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut relation = String::new();
        let mut attributes: Vec<AttributeDescriptor> = Vec::new();
        let mut in_data = false;
        let mut format: Option<DataFormat> = None;
        let mut rows = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| match e.kind() {
                ErrorKind::InvalidData => {
                    at_line(line_num, RunnerError::Parse("invalid UTF-8 in input".to_string()))
                }
                _ => RunnerError::Io(e),
            })?;
            let line = if line_num == 0 {
                line.trim_start_matches('\u{feff}')
            } else {
                line.as_str()
            };
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('%') {
                continue;
            }

            if !in_data {
                match Self::parse_header_line(line).map_err(|e| at_line(line_num, e))? {
                    HeaderLine::Relation(name) => relation = name,
                    HeaderLine::Attribute(attribute) => attributes.push(attribute),
                    HeaderLine::Data => {
                        if attributes.is_empty() {
                            return Err(at_line(
                                line_num,
                                RunnerError::Parse("@data before any @attribute".to_string()),
                            ));
                        }
                        in_data = true;
                    }
                }
                continue;
            }

            let format = *format.get_or_insert_with(|| DataFormat::detect(line));
            let row = match format {
                DataFormat::Dense => Self::parse_dense_row(line, &attributes),
                DataFormat::Sparse => Self::parse_sparse_row(line, &attributes),
            }
            .map_err(|e| at_line(line_num, e))?;
            rows.push(row);
        }

        if !in_data {
            return Err(RunnerError::Parse("missing @data section".to_string()));
        }
        if rows.is_empty() {
            return Err(RunnerError::insufficient_data("no rows after @data"));
        }

        let defaults = attributes.iter().map(|a| a.sparse_default()).collect();

        Ok(RawTable {
            relation,
            attributes,
            defaults,
            format: format.unwrap_or(DataFormat::Dense),
            rows,
        })
    }

    fn parse_header_line(line: &str) -> Result<HeaderLine> {
        let (keyword, rest) = match line.find(char::is_whitespace) {
            Some(pos) => (&line[..pos], line[pos..].trim()),
            None => (line, ""),
        };

        match keyword.to_ascii_lowercase().as_str() {
            "@relation" => Ok(HeaderLine::Relation(unquote(rest))),
            "@attribute" => Self::parse_attribute(rest).map(HeaderLine::Attribute),
            "@data" => Ok(HeaderLine::Data),
            _ => Err(RunnerError::Parse(format!(
                "Unexpected header line: {line}"
            ))),
        }
    }

    /// Parse the part of an `@attribute` line after the keyword
    fn parse_attribute(spec: &str) -> Result<AttributeDescriptor> {
        let (name, type_spec) = match spec.chars().next() {
            Some(q @ ('\'' | '"')) => {
                let mut chars = spec.chars().peekable();
                chars.next();
                let name = read_quoted(&mut chars, q, spec)?;
                (name, chars.collect::<String>())
            }
            Some(_) => {
                let end = spec
                    .find(|c: char| c.is_whitespace() || c == '{')
                    .unwrap_or(spec.len());
                (spec[..end].to_string(), spec[end..].to_string())
            }
            None => {
                return Err(RunnerError::Parse(
                    "Attribute declaration without a name".to_string(),
                ))
            }
        };

        let type_spec = type_spec.trim();
        if type_spec.is_empty() {
            return Err(RunnerError::Parse(format!(
                "Attribute '{name}' has no type"
            )));
        }

        let kind = if let Some(body) = type_spec.strip_prefix('{') {
            let body = body.strip_suffix('}').ok_or_else(|| {
                RunnerError::Parse(format!("Unterminated nominal domain for '{name}'"))
            })?;
            let labels: Vec<String> = split_fields(body)?
                .into_iter()
                .map(|f| f.value)
                .filter(|v| !v.is_empty())
                .collect();
            if labels.is_empty() {
                return Err(RunnerError::Parse(format!(
                    "Nominal attribute '{name}' has an empty domain"
                )));
            }
            AttributeKind::Nominal(labels)
        } else {
            let base = type_spec
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_ascii_lowercase();
            match base.as_str() {
                "numeric" | "real" | "integer" => AttributeKind::Numeric,
                "string" | "date" => AttributeKind::Text,
                other => {
                    return Err(RunnerError::Parse(format!(
                        "Unsupported type '{other}' for attribute '{name}'"
                    )))
                }
            }
        };

        Ok(AttributeDescriptor::new(name, kind))
    }

    /// Parse a positional data row
    fn parse_dense_row(line: &str, attributes: &[AttributeDescriptor]) -> Result<RawRow> {
        if line.starts_with('{') {
            return Err(RunnerError::Parse(
                "Sparse row in a dense data section".to_string(),
            ));
        }

        let fields = split_fields(strip_instance_weight(line))?;
        if fields.len() != attributes.len() {
            return Err(RunnerError::Parse(format!(
                "Expected {} values, got {}",
                attributes.len(),
                fields.len()
            )));
        }

        let cells = fields
            .iter()
            .zip(attributes)
            .map(|(field, attribute)| parse_value(field, attribute))
            .collect::<Result<Vec<_>>>()?;

        Ok(RawRow::Dense(cells))
    }

    /// Parse a `{index value, ...}` data row
    fn parse_sparse_row(line: &str, attributes: &[AttributeDescriptor]) -> Result<RawRow> {
        let body = line.strip_prefix('{').ok_or_else(|| {
            RunnerError::Parse("Dense row in a sparse data section".to_string())
        })?;
        let close = find_unquoted(body, '}')
            .ok_or_else(|| RunnerError::Parse("Unterminated sparse row".to_string()))?;
        let (body, trailer) = (&body[..close], body[close + 1..].trim());

        // Only an instance weight block may follow the row
        if !trailer.is_empty() && strip_instance_weight(&format!("{{}}{trailer}")) != "{}" {
            return Err(RunnerError::Parse(format!(
                "Unexpected content after sparse row: {trailer}"
            )));
        }

        let mut entries = Vec::new();
        let mut chars = body.chars().peekable();
        loop {
            skip_whitespace(&mut chars);
            if chars.peek().is_none() {
                break;
            }

            let mut digits = String::new();
            while let Some(&c) = chars.peek() {
                if !c.is_ascii_digit() {
                    break;
                }
                digits.push(c);
                chars.next();
            }
            let index: usize = digits.parse().map_err(|_| {
                RunnerError::Parse(format!("Invalid sparse index in: {line}"))
            })?;
            if index >= attributes.len() {
                return Err(RunnerError::Parse(format!(
                    "Sparse index {index} out of range for {} attributes",
                    attributes.len()
                )));
            }

            match chars.peek() {
                Some(c) if c.is_whitespace() => skip_whitespace(&mut chars),
                _ => {
                    return Err(RunnerError::Parse(format!(
                        "Sparse entry {index} has no value"
                    )))
                }
            }

            let field = read_field(&mut chars, line)?;
            entries.push((index, parse_value(&field, &attributes[index])?));

            if chars.next().is_none() {
                break;
            }
        }

        entries.sort_by_key(|&(idx, _)| idx);
        if let Some(pair) = entries.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(RunnerError::Parse(format!(
                "Duplicate sparse index {}",
                pair[0].0
            )));
        }

        Ok(RawRow::Sparse(entries))
    }

    /// Name given by `@relation`
    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// Declared attributes in order
    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    pub fn attribute(&self, col: usize) -> &AttributeDescriptor {
        &self.attributes[col]
    }

    /// Number of declared columns
    pub fn n_columns(&self) -> usize {
        self.attributes.len()
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Representation of the data section
    pub fn format(&self) -> DataFormat {
        self.format
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    /// Value of one cell; omitted sparse columns yield the column's zero value
    ///
    /// # Panics
    /// Panics if `row` or `col` is out of range
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        assert!(col < self.attributes.len(), "Column index out of range");
        match &self.rows[row] {
            RawRow::Dense(cells) => &cells[col],
            RawRow::Sparse(entries) => match entries.binary_search_by_key(&col, |(i, _)| *i) {
                Ok(pos) => &entries[pos].1,
                Err(_) => &self.defaults[col],
            },
        }
    }

    /// Index of the class attribute: the first attribute named `class`
    /// (case-insensitive), otherwise the last attribute
    pub fn class_index(&self) -> usize {
        self.attributes
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case("class"))
            .unwrap_or(self.attributes.len() - 1)
    }

    /// Whether every column outside `excluded` is numeric
    pub fn is_numeric_except(&self, excluded: &[usize]) -> bool {
        self.attributes
            .iter()
            .enumerate()
            .filter(|(i, _)| !excluded.contains(i))
            .all(|(_, a)| a.kind.is_numeric())
    }
}

impl FromStr for RawTable {
    type Err = RunnerError;

    /// Parse ARFF content held in memory
    fn from_str(content: &str) -> Result<Self> {
        Self::from_reader(Cursor::new(content))
    }
}

fn at_line(line_num: usize, err: RunnerError) -> RunnerError {
    match err {
        RunnerError::Parse(msg) => {
            RunnerError::Parse(format!("Error parsing line {}: {}", line_num + 1, msg))
        }
        other => other,
    }
}

fn parse_value(field: &Field, attribute: &AttributeDescriptor) -> Result<Cell> {
    if !field.quoted && field.value == "?" {
        return Ok(Cell::Missing);
    }

    match &attribute.kind {
        AttributeKind::Numeric => {
            let value = field.value.parse::<f64>().map_err(|_| {
                RunnerError::Parse(format!(
                    "Invalid numeric value '{}' for attribute '{}'",
                    field.value, attribute.name
                ))
            })?;
            if value.is_nan() {
                Ok(Cell::Missing)
            } else {
                Ok(Cell::Number(value))
            }
        }
        AttributeKind::Nominal(labels) => {
            if labels.iter().any(|l| *l == field.value) {
                Ok(Cell::Label(field.value.clone()))
            } else {
                Err(RunnerError::Parse(format!(
                    "Value '{}' is not in the domain of attribute '{}'",
                    field.value, attribute.name
                )))
            }
        }
        AttributeKind::Text => Ok(Cell::Text(field.value.clone())),
    }
}

/// Drop a trailing `,{weight}` instance-weight block
fn strip_instance_weight(line: &str) -> &str {
    if line.ends_with('}') {
        if let Some(open) = line.rfind('{') {
            if let Some(head) = line[..open].trim_end().strip_suffix(',') {
                return head.trim_end();
            }
        }
    }
    line
}

fn find_unquoted(text: &str, target: char) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (pos, c) in text.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == target => return Some(pos),
            None => {}
        }
    }
    None
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
        chars.next();
    }
}

/// Read a quoted token; the opening quote has already been consumed
fn read_quoted(chars: &mut Peekable<Chars<'_>>, quote: char, line: &str) -> Result<String> {
    let mut value = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    value.push(escaped);
                }
            }
            c if c == quote => return Ok(value),
            c => value.push(c),
        }
    }
    Err(RunnerError::Parse(format!("Unterminated quote in: {line}")))
}

/// Read one value up to (not including) the next separating comma
fn read_field(chars: &mut Peekable<Chars<'_>>, line: &str) -> Result<Field> {
    skip_whitespace(chars);
    match chars.peek().copied() {
        Some(q @ ('\'' | '"')) => {
            chars.next();
            let value = read_quoted(chars, q, line)?;
            skip_whitespace(chars);
            match chars.peek() {
                None | Some(',') => Ok(Field {
                    value,
                    quoted: true,
                }),
                Some(c) => Err(RunnerError::Parse(format!(
                    "Unexpected character '{c}' after quoted value in: {line}"
                ))),
            }
        }
        _ => {
            let mut value = String::new();
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                value.push(c);
                chars.next();
            }
            Ok(Field {
                value: value.trim_end().to_string(),
                quoted: false,
            })
        }
    }
}

/// Split a comma separated list, respecting quotes
fn split_fields(line: &str) -> Result<Vec<Field>> {
    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();
    loop {
        fields.push(read_field(&mut chars, line)?);
        // Either a comma or the end of the line
        if chars.next().is_none() {
            break;
        }
    }
    Ok(fields)
}

fn unquote(text: &str) -> String {
    let text = text.trim();
    for q in ['\'', '"'] {
        if let Some(inner) = text.strip_prefix(q).and_then(|t| t.strip_suffix(q)) {
            return inner.to_string();
        }
    }
    text.to_string()
}
