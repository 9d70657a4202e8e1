//! The eight BAI lockbox record variants and the leading-digit factory.
//!
//! Each variant declares its fixed byte layout as a `const` schema table and
//! decodes one line into a typed, immutable struct. Every decoded record
//! keeps the raw line it came from, so the fixed-width form of any field can
//! be recovered downstream.

use crate::error::{ErrorKind, Result};
use crate::money::Amount;
use crate::schema::{FieldClass, FieldSpec, RawFields, MAX_RECORD_LEN, NOMINAL_RECORD_LEN};
use chrono::{NaiveDate, NaiveTime};

const fn numeric(name: &'static str, start: usize, end: usize) -> FieldSpec {
    FieldSpec {
        name,
        start,
        end,
        class: FieldClass::Numeric,
    }
}

const fn alphanumeric(name: &'static str, start: usize, end: usize) -> FieldSpec {
    FieldSpec {
        name,
        start,
        end,
        class: FieldClass::Alphanumeric,
    }
}

const fn filler(start: usize) -> FieldSpec {
    FieldSpec {
        name: "filler",
        start,
        end: NOMINAL_RECORD_LEN,
        class: FieldClass::Blank,
    }
}

/// Tag 1. Opens the transmission envelope.
#[derive(Debug, Clone)]
pub struct ImmediateAddressHeader {
    pub raw: Box<str>,
    pub priority_code: String,
    pub destination_id: String,
    pub originating_trn: String,
    pub processing_date: NaiveDate,
    pub processing_time: NaiveTime,
}

impl ImmediateAddressHeader {
    pub const SCHEMA: &'static [FieldSpec] = &[
        numeric("record_type", 0, 1),
        numeric("priority_code", 1, 3),
        alphanumeric("destination_id", 3, 13),
        numeric("originating_trn", 13, 23),
        numeric("processing_date", 23, 29),
        numeric("processing_time", 29, 33),
        filler(33),
    ];

    pub fn decode(line: &str) -> Result<Self> {
        let fields = RawFields::decode(line, Self::SCHEMA)?;
        Ok(ImmediateAddressHeader {
            raw: line.into(),
            priority_code: fields.raw("priority_code").to_string(),
            destination_id: fields.raw("destination_id").to_string(),
            originating_trn: fields.raw("originating_trn").to_string(),
            processing_date: fields.date_yymmdd("processing_date")?,
            processing_time: fields.time_hhmm("processing_time")?,
        })
    }
}

/// Tag 2. File-level service record of the transmission envelope.
/// All fields are exposed in their raw wire form.
#[derive(Debug, Clone)]
pub struct ServiceRecord {
    pub raw: Box<str>,
    pub ultimate_dest_and_origin: String,
    pub ref_code: String,
    pub service_type: String,
    pub record_size: String,
    pub blocking_factor: String,
    pub format_code: String,
}

impl ServiceRecord {
    pub const SCHEMA: &'static [FieldSpec] = &[
        numeric("record_type", 0, 1),
        alphanumeric("ultimate_dest_and_origin", 1, 21),
        numeric("ref_code", 21, 31),
        numeric("service_type", 31, 34),
        numeric("record_size", 34, 37),
        numeric("blocking_factor", 37, 41),
        numeric("format_code", 41, 42),
        filler(42),
    ];

    pub fn decode(line: &str) -> Result<Self> {
        let fields = RawFields::decode(line, Self::SCHEMA)?;
        Ok(ServiceRecord {
            raw: line.into(),
            ultimate_dest_and_origin: fields.raw("ultimate_dest_and_origin").to_string(),
            ref_code: fields.raw("ref_code").to_string(),
            service_type: fields.raw("service_type").to_string(),
            record_size: fields.raw("record_size").to_string(),
            blocking_factor: fields.raw("blocking_factor").to_string(),
            format_code: fields.raw("format_code").to_string(),
        })
    }
}

/// Tag 5. Opens one lockbox's section of the file.
#[derive(Debug, Clone)]
pub struct DetailHeader {
    pub raw: Box<str>,
    pub batch_number: u64,
    pub ref_code: String,
    pub lockbox_number: String,
    pub deposit_date: NaiveDate,
    pub ultimate_dest_and_origin: String,
}

impl DetailHeader {
    pub const SCHEMA: &'static [FieldSpec] = &[
        numeric("record_type", 0, 1),
        numeric("batch_number", 1, 4),
        numeric("ref_code", 4, 7),
        numeric("lockbox_number", 7, 14),
        numeric("deposit_date", 14, 20),
        alphanumeric("ultimate_dest_and_origin", 20, 40),
        filler(40),
    ];

    pub fn decode(line: &str) -> Result<Self> {
        let fields = RawFields::decode(line, Self::SCHEMA)?;
        Ok(DetailHeader {
            raw: line.into(),
            batch_number: fields.integer("batch_number")?,
            ref_code: fields.raw("ref_code").to_string(),
            lockbox_number: fields.raw("lockbox_number").to_string(),
            deposit_date: fields.date_yymmdd("deposit_date")?,
            ultimate_dest_and_origin: fields.raw("ultimate_dest_and_origin").to_string(),
        })
    }
}

/// Tag 6. One check's core data. This is the only variant whose layout runs
/// the full 160 bytes: the payee name occupies everything after byte 82.
///
/// `check_date` is encoded MMDDYY, unlike every other date field in the
/// format (YYMMDD). The asymmetry is part of the wire format.
#[derive(Debug, Clone)]
pub struct DetailRecord {
    pub raw: Box<str>,
    pub batch_number: u64,
    pub item_number: u64,
    pub check_amount: Amount,
    pub transit_routing_number: String,
    pub dd_account_number: String,
    pub check_number: u64,
    pub check_date: NaiveDate,
    pub remitter_name: String,
    pub payee_name: String,
}

impl DetailRecord {
    pub const SCHEMA: &'static [FieldSpec] = &[
        numeric("record_type", 0, 1),
        numeric("batch_number", 1, 4),
        numeric("item_number", 4, 7),
        numeric("check_amount", 7, 17),
        numeric("transit_routing_number", 17, 26),
        numeric("dd_account_number", 26, 36),
        numeric("check_number", 36, 46),
        numeric("check_date", 46, 52),
        alphanumeric("remitter_name", 52, 82),
        alphanumeric("payee_name", 82, MAX_RECORD_LEN),
    ];

    pub fn decode(line: &str) -> Result<Self> {
        let fields = RawFields::decode(line, Self::SCHEMA)?;
        Ok(DetailRecord {
            raw: line.into(),
            batch_number: fields.integer("batch_number")?,
            item_number: fields.integer("item_number")?,
            check_amount: fields.cents("check_amount")?,
            transit_routing_number: fields.raw("transit_routing_number").to_string(),
            dd_account_number: fields.raw("dd_account_number").to_string(),
            check_number: fields.integer("check_number")?,
            check_date: fields.date_mmddyy("check_date")?,
            remitter_name: fields.trimmed("remitter_name").to_string(),
            payee_name: fields.trimmed("payee_name").to_string(),
        })
    }
}

/// Tag 4. Continuation of the preceding detail record, carrying memo text
/// too long for the detail's fixed field.
#[derive(Debug, Clone)]
pub struct DetailOverflowRecord {
    pub raw: Box<str>,
    pub batch_number: u64,
    pub item_number: u64,
    pub overflow_record_type: u64,
    pub overflow_sequence_number: u64,
    pub overflow_indicator: String,
    pub memo_line: String,
}

impl DetailOverflowRecord {
    pub const SCHEMA: &'static [FieldSpec] = &[
        numeric("record_type", 0, 1),
        numeric("batch_number", 1, 4),
        numeric("item_number", 4, 7),
        numeric("overflow_record_type", 7, 8),
        numeric("overflow_sequence_number", 8, 10),
        numeric("overflow_indicator", 10, 11),
        alphanumeric("memo_line", 11, 41),
        filler(41),
    ];

    pub fn decode(line: &str) -> Result<Self> {
        let fields = RawFields::decode(line, Self::SCHEMA)?;
        Ok(DetailOverflowRecord {
            raw: line.into(),
            batch_number: fields.integer("batch_number")?,
            item_number: fields.integer("item_number")?,
            overflow_record_type: fields.integer("overflow_record_type")?,
            overflow_sequence_number: fields.integer("overflow_sequence_number")?,
            overflow_indicator: fields.raw("overflow_indicator").to_string(),
            memo_line: fields.trimmed("memo_line").to_string(),
        })
    }
}

/// Tag 7. Closes the current batch and declares its totals.
#[derive(Debug, Clone)]
pub struct BatchTotalRecord {
    pub raw: Box<str>,
    pub batch_number: u64,
    pub item_number: u64,
    pub lockbox_number: String,
    pub deposit_date: NaiveDate,
    pub total_number_remittances: u64,
    pub check_dollar_total: Amount,
}

impl BatchTotalRecord {
    pub const SCHEMA: &'static [FieldSpec] = &[
        numeric("record_type", 0, 1),
        numeric("batch_number", 1, 4),
        numeric("item_number", 4, 7),
        numeric("lockbox_number", 7, 14),
        numeric("deposit_date", 14, 20),
        numeric("total_number_remittances", 20, 23),
        numeric("check_dollar_total", 23, 33),
        filler(33),
    ];

    pub fn decode(line: &str) -> Result<Self> {
        let fields = RawFields::decode(line, Self::SCHEMA)?;
        Ok(BatchTotalRecord {
            raw: line.into(),
            batch_number: fields.integer("batch_number")?,
            item_number: fields.integer("item_number")?,
            lockbox_number: fields.raw("lockbox_number").to_string(),
            deposit_date: fields.date_yymmdd("deposit_date")?,
            total_number_remittances: fields.integer("total_number_remittances")?,
            check_dollar_total: fields.cents("check_dollar_total")?,
        })
    }
}

/// Tag 8. Closes the current lockbox and declares its totals.
#[derive(Debug, Clone)]
pub struct ServiceTotalRecord {
    pub raw: Box<str>,
    pub batch_number: u64,
    pub item_number: u64,
    pub lockbox_number: String,
    pub deposit_date: NaiveDate,
    pub total_num_checks: u64,
    pub check_dollar_total: Amount,
}

impl ServiceTotalRecord {
    pub const SCHEMA: &'static [FieldSpec] = &[
        numeric("record_type", 0, 1),
        numeric("batch_number", 1, 4),
        numeric("item_number", 4, 7),
        numeric("lockbox_number", 7, 14),
        numeric("deposit_date", 14, 20),
        numeric("total_num_checks", 20, 24),
        numeric("check_dollar_total", 24, 34),
        filler(34),
    ];

    pub fn decode(line: &str) -> Result<Self> {
        let fields = RawFields::decode(line, Self::SCHEMA)?;
        Ok(ServiceTotalRecord {
            raw: line.into(),
            batch_number: fields.integer("batch_number")?,
            item_number: fields.integer("item_number")?,
            lockbox_number: fields.raw("lockbox_number").to_string(),
            deposit_date: fields.date_yymmdd("deposit_date")?,
            total_num_checks: fields.integer("total_num_checks")?,
            check_dollar_total: fields.cents("check_dollar_total")?,
        })
    }
}

/// Tag 9. Closes the whole transmission.
///
/// `total_num_records` is stored but deliberately never cross-checked
/// against the number of records actually consumed; the format is lenient
/// here and the parser preserves that.
#[derive(Debug, Clone)]
pub struct DestinationTrailerRecord {
    pub raw: Box<str>,
    pub total_num_records: u64,
}

impl DestinationTrailerRecord {
    pub const SCHEMA: &'static [FieldSpec] = &[
        numeric("record_type", 0, 1),
        numeric("total_num_records", 1, 7),
        filler(7),
    ];

    pub fn decode(line: &str) -> Result<Self> {
        let fields = RawFields::decode(line, Self::SCHEMA)?;
        Ok(DestinationTrailerRecord {
            raw: line.into(),
            total_num_records: fields.integer("total_num_records")?,
        })
    }
}

/// A decoded record of any variant.
#[derive(Debug, Clone)]
pub enum Record {
    ImmediateAddressHeader(ImmediateAddressHeader),
    Service(ServiceRecord),
    DetailHeader(DetailHeader),
    Detail(DetailRecord),
    DetailOverflow(DetailOverflowRecord),
    BatchTotal(BatchTotalRecord),
    ServiceTotal(ServiceTotalRecord),
    DestinationTrailer(DestinationTrailerRecord),
}

impl Record {
    /// Dispatches on the leading digit of a line and decodes the matching
    /// variant. There is no fallback variant: every line must carry a known
    /// tag, and an empty line is a structure error.
    pub fn from_line(line: &str) -> Result<Record> {
        let tag = line
            .chars()
            .next()
            .ok_or_else(|| ErrorKind::Structure("empty record".to_string()))?;

        let record = match tag {
            '1' => Record::ImmediateAddressHeader(ImmediateAddressHeader::decode(line)?),
            '2' => Record::Service(ServiceRecord::decode(line)?),
            '4' => Record::DetailOverflow(DetailOverflowRecord::decode(line)?),
            '5' => Record::DetailHeader(DetailHeader::decode(line)?),
            '6' => Record::Detail(DetailRecord::decode(line)?),
            '7' => Record::BatchTotal(BatchTotalRecord::decode(line)?),
            '8' => Record::ServiceTotal(ServiceTotalRecord::decode(line)?),
            '9' => Record::DestinationTrailer(DestinationTrailerRecord::decode(line)?),
            other => return Err(ErrorKind::UnknownRecordType { tag: other }.into()),
        };

        Ok(record)
    }

    /// Short variant name, for logging.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Record::ImmediateAddressHeader(_) => "immediate address header",
            Record::Service(_) => "service record",
            Record::DetailHeader(_) => "lockbox detail header",
            Record::Detail(_) => "detail record",
            Record::DetailOverflow(_) => "detail overflow record",
            Record::BatchTotal(_) => "batch total record",
            Record::ServiceTotal(_) => "service total record",
            Record::DestinationTrailer(_) => "destination trailer record",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::{NaiveDate, NaiveTime};

    const ALL_SCHEMAS: &[(&str, &[FieldSpec])] = &[
        ("immediate address header", ImmediateAddressHeader::SCHEMA),
        ("service record", ServiceRecord::SCHEMA),
        ("detail header", DetailHeader::SCHEMA),
        ("detail record", DetailRecord::SCHEMA),
        ("detail overflow record", DetailOverflowRecord::SCHEMA),
        ("batch total record", BatchTotalRecord::SCHEMA),
        ("service total record", ServiceTotalRecord::SCHEMA),
        ("destination trailer record", DestinationTrailerRecord::SCHEMA),
    ];

    #[test]
    fn test_schemas_start_with_record_type_digit() {
        for (name, schema) in ALL_SCHEMAS {
            let first = &schema[0];
            assert_eq!(first.name, "record_type", "{}", name);
            assert_eq!((first.start, first.end), (0, 1), "{}", name);
            assert_eq!(first.class, FieldClass::Numeric, "{}", name);
        }
    }

    #[test]
    fn test_schemas_are_contiguous_and_non_overlapping() {
        for (name, schema) in ALL_SCHEMAS {
            let mut cursor = 0;
            for spec in *schema {
                assert_eq!(
                    spec.start, cursor,
                    "{}: field {} leaves a gap or overlaps",
                    name, spec.name
                );
                assert!(spec.start < spec.end, "{}: field {} is empty", name, spec.name);
                cursor = spec.end;
            }
            assert!(
                cursor == NOMINAL_RECORD_LEN || cursor == MAX_RECORD_LEN,
                "{}: layout ends at {}",
                name,
                cursor
            );
        }
    }

    #[test]
    fn test_immediate_address_header() {
        let rec = ImmediateAddressHeader::decode("100ABCDEFGHIJ00999999911605231800").unwrap();

        assert_eq!(rec.priority_code, "00");
        assert_eq!(rec.destination_id, "ABCDEFGHIJ");
        assert_eq!(rec.originating_trn, "0099999991");
        assert_eq!(
            rec.processing_date,
            NaiveDate::from_ymd_opt(2016, 5, 23).unwrap()
        );
        assert_eq!(
            rec.processing_time,
            NaiveTime::from_hms_opt(18, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_immediate_address_header_invalid_numeric_field() {
        let err =
            ImmediateAddressHeader::decode("100ABCDEFGHIJ009AA999911605231800").unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::FieldType {
                field: "originating_trn",
                expected: FieldClass::Numeric,
            }
        ));
        assert_eq!(
            err.to_string(),
            "field originating_trn does not match expected type numeric"
        );
    }

    #[test]
    fn test_immediate_address_header_invalid_alphanumeric_field() {
        let err =
            ImmediateAddressHeader::decode("100A~CDEFGHIJ00999999911605231800").unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::FieldType {
                field: "destination_id",
                expected: FieldClass::Alphanumeric,
            }
        ));
    }

    #[test]
    fn test_service_record() {
        let rec = ServiceRecord::decode("2ABCDEFGHIJ0099999991000000000040008000801").unwrap();

        assert_eq!(rec.ultimate_dest_and_origin, "ABCDEFGHIJ0099999991");
        assert_eq!(rec.ref_code, "0000000000");
        assert_eq!(rec.service_type, "400");
        assert_eq!(rec.record_size, "080");
        assert_eq!(rec.blocking_factor, "0080");
        assert_eq!(rec.format_code, "1");
    }

    #[test]
    fn test_detail_header() {
        let rec = DetailHeader::decode("50000000022222160523ABCDEFGHIJ0099999991").unwrap();

        assert_eq!(rec.batch_number, 0);
        assert_eq!(rec.ref_code, "000");
        assert_eq!(rec.lockbox_number, "0022222");
        assert_eq!(
            rec.deposit_date,
            NaiveDate::from_ymd_opt(2016, 5, 23).unwrap()
        );
        assert_eq!(rec.ultimate_dest_and_origin, "ABCDEFGHIJ0099999991");
    }

    #[test]
    fn test_detail_record() {
        let line = concat!(
            "6001001000070000005500270700123455550000000180051616",
            "BOB E SMITH                   ",
            "MY BUSINESS COMPANY"
        );
        let rec = DetailRecord::decode(line).unwrap();

        assert_eq!(rec.batch_number, 1);
        assert_eq!(rec.item_number, 1);
        assert_eq!(rec.check_amount, Amount::from_cents(700000));
        assert_eq!(rec.check_amount.to_string(), "7000.00");
        assert_eq!(rec.transit_routing_number, "055002707");
        assert_eq!(rec.dd_account_number, "0012345555");
        assert_eq!(rec.check_number, 180);
        // MMDDYY, unlike the deposit dates
        assert_eq!(
            rec.check_date,
            NaiveDate::from_ymd_opt(2016, 5, 16).unwrap()
        );
        assert_eq!(rec.remitter_name, "BOB E SMITH");
        assert_eq!(rec.payee_name, "MY BUSINESS COMPANY");
        // The raw fixed-width form is retained on the record
        assert_eq!(&rec.raw[52..82], "BOB E SMITH                   ");
    }

    #[test]
    fn test_detail_overflow_record() {
        let rec = DetailOverflowRecord::decode("40010016019CE554").unwrap();

        assert_eq!(rec.batch_number, 1);
        assert_eq!(rec.item_number, 1);
        assert_eq!(rec.overflow_record_type, 6);
        assert_eq!(rec.overflow_sequence_number, 1);
        assert_eq!(rec.overflow_indicator, "9");
        assert_eq!(rec.memo_line, "CE554");
    }

    #[test]
    fn test_overflow_memo_with_valid_punctuation() {
        let rec = DetailOverflowRecord::decode("40010016019(BLAH:)").unwrap();
        assert_eq!(rec.memo_line, "(BLAH:)");
    }

    #[test]
    fn test_batch_total_record() {
        let rec = BatchTotalRecord::decode("700100000222221605230010000700000").unwrap();

        assert_eq!(rec.batch_number, 1);
        assert_eq!(rec.item_number, 0);
        assert_eq!(rec.lockbox_number, "0022222");
        assert_eq!(
            rec.deposit_date,
            NaiveDate::from_ymd_opt(2016, 5, 23).unwrap()
        );
        assert_eq!(rec.total_number_remittances, 1);
        assert_eq!(rec.check_dollar_total, Amount::from_cents(700000));
    }

    #[test]
    fn test_service_total_record() {
        let rec = ServiceTotalRecord::decode("8000000002222216052300010000700000").unwrap();

        assert_eq!(rec.batch_number, 0);
        assert_eq!(rec.lockbox_number, "0022222");
        assert_eq!(rec.total_num_checks, 1);
        assert_eq!(rec.check_dollar_total, Amount::from_cents(700000));
    }

    #[test]
    fn test_destination_trailer_record() {
        let rec = DestinationTrailerRecord::decode("9000008").unwrap();
        assert_eq!(rec.total_num_records, 8);
    }

    #[test]
    fn test_factory_unknown_tag() {
        let err = Record::from_line("3000008").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnknownRecordType { tag: '3' }));
        assert_eq!(err.to_string(), "unknown record type 3");
    }

    #[test]
    fn test_factory_empty_line() {
        let err = Record::from_line("").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Structure(_)));
    }

    #[test]
    fn test_factory_dispatch() {
        let rec = Record::from_line("9000008").unwrap();
        assert!(matches!(rec, Record::DestinationTrailer(_)));
        assert_eq!(rec.variant_name(), "destination trailer record");
    }

    #[test]
    fn test_overlong_detail_record() {
        let line = format!("6{}", "0".repeat(MAX_RECORD_LEN));
        let err = DetailRecord::decode(&line).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::RecordTooLong { limit: 160 }));
    }
}
