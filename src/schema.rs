//! Fixed-width field schemas and the field-level decoder.
//!
//! Every record variant declares a `const` table of [`FieldSpec`] entries:
//! a named byte range plus the class of bytes allowed in it. [`RawFields`]
//! checks a whole line against such a table and then exposes typed accessors
//! over the validated slices (integers, cent amounts, dates, times).
//!
//! Offsets are 0-based and end-exclusive. Slot `0..1` is always the numeric
//! record-type digit. Byte ranges past the end of a short line decode as
//! empty slices, which satisfies `Blank` but no other class.

use crate::error::{ErrorKind, Result};
use crate::money::Amount;
use chrono::{NaiveDate, NaiveTime};
use std::fmt;

/// Hard ceiling on line length. Officially records are 104 bytes, but real
/// transmissions have been observed to run longer.
pub const MAX_RECORD_LEN: usize = 160;

/// The nominal record width; unspecified trailing bytes up to this offset
/// are declared as `Blank` filler.
pub const NOMINAL_RECORD_LEN: usize = 104;

/// The class of bytes a field slot may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    /// ASCII digits only, non-empty
    Numeric,

    /// Uppercase letters, digits, space, and `;:,./()-`, non-empty
    Alphanumeric,

    /// Whitespace only; an empty slice is fine
    Blank,
}

impl FieldClass {
    /// Checks a raw byte slice against this class. The whole slice must
    /// match; partial matches are rejected.
    fn matches(self, raw: &[u8]) -> bool {
        match self {
            FieldClass::Numeric => !raw.is_empty() && raw.iter().all(u8::is_ascii_digit),
            FieldClass::Alphanumeric => {
                !raw.is_empty()
                    && raw.iter().all(|&b| {
                        b == b' '
                            || b.is_ascii_uppercase()
                            || b.is_ascii_digit()
                            || matches!(b, b';' | b':' | b',' | b'.' | b'/' | b'(' | b')' | b'-')
                    })
            }
            FieldClass::Blank => raw.iter().all(u8::is_ascii_whitespace),
        }
    }
}

impl fmt::Display for FieldClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldClass::Numeric => "numeric",
            FieldClass::Alphanumeric => "alphanumeric",
            FieldClass::Blank => "blank",
        };
        write!(f, "{}", name)
    }
}

/// One named field slot in a record layout.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub start: usize,
    pub end: usize,
    pub class: FieldClass,
}

/// A line checked against a schema, with typed access to its field slices.
///
/// Construction performs all class validation up front; the accessors then
/// only deal with conversion failures.
#[derive(Debug)]
pub struct RawFields<'a> {
    line: &'a str,
    schema: &'static [FieldSpec],
}

impl<'a> RawFields<'a> {
    /// Validates `line` against `schema`.
    ///
    /// Fails with [`ErrorKind::RecordTooLong`] if the line exceeds the
    /// 160-byte ceiling, or [`ErrorKind::FieldType`] on the first field
    /// whose bytes do not match its declared class.
    pub fn decode(line: &'a str, schema: &'static [FieldSpec]) -> Result<Self> {
        if line.len() > MAX_RECORD_LEN {
            return Err(ErrorKind::RecordTooLong {
                limit: MAX_RECORD_LEN,
            }
            .into());
        }

        let bytes = line.as_bytes();
        for spec in schema {
            let raw = clamped(bytes, spec);
            if !spec.class.matches(raw) {
                return Err(ErrorKind::FieldType {
                    field: spec.name,
                    expected: spec.class,
                }
                .into());
            }
        }

        Ok(RawFields { line, schema })
    }

    fn spec(&self, name: &'static str) -> &FieldSpec {
        // Safety: field names are compile-time constants taken from the same
        // schema table the record decoder declares
        self.schema
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("schema has no field named {}", name))
    }

    /// The raw slice for a field, exactly as it appeared on the wire
    /// (clamped at line end for short lines).
    pub fn raw(&self, name: &'static str) -> &'a str {
        let spec = self.spec(name);
        let raw = clamped(self.line.as_bytes(), spec);
        // Safety: decode() verified every field is ASCII-only
        std::str::from_utf8(raw).expect("validated field is ASCII")
    }

    /// The raw slice with surrounding whitespace removed, for name and memo
    /// fields whose fixed-width form is space padded.
    pub fn trimmed(&self, name: &'static str) -> &'a str {
        self.raw(name).trim()
    }

    /// Parses a numeric field as a base-10 integer. Leading zeros are fine;
    /// the magnitude is bounded only by the field width.
    pub fn integer(&self, name: &'static str) -> Result<u64> {
        let raw = self.raw(name);
        raw.parse::<u64>().map_err(|_| {
            ErrorKind::FieldFormat {
                field: name,
                raw: raw.to_string(),
            }
            .into()
        })
    }

    /// Parses a numeric field as an integer count of cents and scales it to
    /// a fixed-point dollar amount.
    pub fn cents(&self, name: &'static str) -> Result<Amount> {
        let raw = self.raw(name);
        let cents = raw
            .parse::<i64>()
            .map_err(|_| field_format_error(name, raw))?;
        Ok(Amount::from_cents(cents))
    }

    /// Parses a 6-digit date field in YYMMDD order, year offset +2000.
    pub fn date_yymmdd(&self, name: &'static str) -> Result<NaiveDate> {
        let raw = self.raw(name);
        parse_date(raw, DateLayout::Yymmdd)
    }

    /// Parses a 6-digit date field in MMDDYY order, year offset +2000.
    ///
    /// Only the detail record's `check_date` uses this order; the asymmetry
    /// is a quirk of the wire format and must be preserved exactly.
    pub fn date_mmddyy(&self, name: &'static str) -> Result<NaiveDate> {
        let raw = self.raw(name);
        parse_date(raw, DateLayout::Mmddyy)
    }

    /// Parses a 4-digit HHMM field as a 24-hour time.
    pub fn time_hhmm(&self, name: &'static str) -> Result<NaiveTime> {
        let raw = self.raw(name);
        if raw.len() != 4 {
            return Err(time_error(raw));
        }

        let hour: u32 = raw[0..2].parse().map_err(|_| time_error(raw))?;
        let minute: u32 = raw[2..4].parse().map_err(|_| time_error(raw))?;

        NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| time_error(raw))
    }
}

#[derive(Clone, Copy)]
enum DateLayout {
    Yymmdd,
    Mmddyy,
}

impl DateLayout {
    fn name(self) -> &'static str {
        match self {
            DateLayout::Yymmdd => "YYMMDD",
            DateLayout::Mmddyy => "MMDDYY",
        }
    }
}

fn parse_date(raw: &str, layout: DateLayout) -> Result<NaiveDate> {
    let err = || {
        crate::error::LockboxError::new(ErrorKind::DateFormat {
            raw: raw.to_string(),
            layout: layout.name(),
        })
    };

    if raw.len() != 6 {
        return Err(err());
    }

    let (year_range, month_range, day_range) = match layout {
        DateLayout::Yymmdd => (0..2, 2..4, 4..6),
        DateLayout::Mmddyy => (4..6, 0..2, 2..4),
    };

    let year: i32 = raw[year_range].parse().map_err(|_| err())?;
    let month: u32 = raw[month_range].parse().map_err(|_| err())?;
    let day: u32 = raw[day_range].parse().map_err(|_| err())?;

    NaiveDate::from_ymd_opt(year + 2000, month, day).ok_or_else(err)
}

fn time_error(raw: &str) -> crate::error::LockboxError {
    crate::error::LockboxError::new(ErrorKind::TimeFormat {
        raw: raw.to_string(),
    })
}

fn field_format_error(field: &'static str, raw: &str) -> crate::error::LockboxError {
    crate::error::LockboxError::new(ErrorKind::FieldFormat {
        field,
        raw: raw.to_string(),
    })
}

fn clamped<'a>(bytes: &'a [u8], spec: &FieldSpec) -> &'a [u8] {
    let start = spec.start.min(bytes.len());
    let end = spec.end.min(bytes.len());
    &bytes[start..end]
}
