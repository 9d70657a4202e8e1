//! The assembled lockbox document tree and its consistency validation.
//!
//! Everything in this module is immutable once assembly closes it: a batch
//! after its batch total record, a lockbox after its service total record,
//! the file after its destination trailer. Ownership runs strictly downward
//! (file owns lockboxes own batches own details own overflows).

use crate::assembler::Assembler;
use crate::check::Check;
use crate::error::{ErrorKind, Result};
use crate::money::Amount;
use crate::record::{
    BatchTotalRecord, DestinationTrailerRecord, DetailHeader, DetailOverflowRecord, DetailRecord,
    ImmediateAddressHeader, Record, ServiceRecord, ServiceTotalRecord,
};
use std::io::{BufRead, Write};

/// One check's detail record plus the overflow records that extend it.
#[derive(Debug, Clone)]
pub struct Detail {
    pub record: DetailRecord,
    pub overflow_records: Vec<DetailOverflowRecord>,
}

impl Detail {
    pub fn new(record: DetailRecord) -> Self {
        Detail {
            record,
            overflow_records: Vec::new(),
        }
    }

    pub fn push_overflow(&mut self, record: DetailOverflowRecord) {
        self.overflow_records.push(record);
    }

    /// The memo text: every overflow record's fragment, concatenated in
    /// arrival order.
    pub fn memo(&self) -> String {
        self.overflow_records
            .iter()
            .map(|o| o.memo_line.as_str())
            .collect()
    }
}

/// A closed batch: its details and the batch total record that closed it.
#[derive(Debug, Clone)]
pub struct Batch {
    pub details: Vec<Detail>,
    pub summary: BatchTotalRecord,
}

impl Batch {
    /// Recomputes this batch's aggregates and compares them against the
    /// declared batch total record. Exact fixed-point comparison; repeating
    /// the check is safe.
    pub fn validate(&self) -> Result<()> {
        let computed: Amount = self.details.iter().map(|d| d.record.check_amount).sum();
        if computed != self.summary.check_dollar_total {
            return Err(ErrorKind::Consistency(format!(
                "batch expected dollar total ({}) does not match actual total ({})",
                self.summary.check_dollar_total, computed,
            ))
            .into());
        }

        if self.details.len() as u64 != self.summary.total_number_remittances {
            return Err(ErrorKind::Consistency(format!(
                "batch expected number of remittances ({}) does not match actual \
                 number of remittances ({})",
                self.summary.total_number_remittances,
                self.details.len(),
            ))
            .into());
        }

        Ok(())
    }

    pub fn checks(&self) -> impl Iterator<Item = Check> + '_ {
        self.details.iter().map(Check::from)
    }
}

/// A closed lockbox: its detail header, its closed batches, and the service
/// total record that closed it.
#[derive(Debug, Clone)]
pub struct Lockbox {
    pub header: DetailHeader,
    pub batches: Vec<Batch>,
    pub total_record: ServiceTotalRecord,
}

impl Lockbox {
    /// Re-validates every batch, then checks this lockbox's declared totals
    /// against the sums over its batch total records.
    pub fn validate(&self) -> Result<()> {
        for batch in &self.batches {
            batch.validate()?;
        }

        let num_remittances: u64 = self
            .batches
            .iter()
            .map(|b| b.summary.total_number_remittances)
            .sum();
        let dollar_total: Amount = self
            .batches
            .iter()
            .map(|b| b.summary.check_dollar_total)
            .sum();

        if self.total_record.total_num_checks != num_remittances {
            return Err(ErrorKind::Consistency(format!(
                "expected number of checks for lockbox {} ({}) does not match actual \
                 number ({})",
                self.total_record.lockbox_number, self.total_record.total_num_checks,
                num_remittances,
            ))
            .into());
        }

        if self.total_record.check_dollar_total != dollar_total {
            return Err(ErrorKind::Consistency(format!(
                "expected dollar total for lockbox {} ({}) does not match actual \
                 total ({})",
                self.total_record.lockbox_number, self.total_record.check_dollar_total,
                dollar_total,
            ))
            .into());
        }

        Ok(())
    }

    pub fn checks(&self) -> impl Iterator<Item = Check> + '_ {
        self.batches.iter().flat_map(Batch::checks)
    }
}

/// A fully assembled and validated lockbox transmission.
#[derive(Debug, Clone)]
pub struct LockboxFile {
    pub header_record: ImmediateAddressHeader,
    pub service_record: ServiceRecord,
    pub lockboxes: Vec<Lockbox>,
    pub destination_trailer_record: DestinationTrailerRecord,
}

impl LockboxFile {
    /// Parses an ordered sequence of lines into a validated file.
    ///
    /// Each line is trimmed of surrounding whitespace before decoding. The
    /// first failure terminates the parse; the error carries the 1-based
    /// line number and the raw line text alongside the original kind. There
    /// is never a partially built file.
    pub fn from_lines<I>(lines: I) -> Result<LockboxFile>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut assembler = Assembler::new();

        for (idx, line) in lines.into_iter().enumerate() {
            let line = line.as_ref().trim();
            let line_number = idx + 1;

            let record =
                Record::from_line(line).map_err(|e| e.with_context(line_number, line))?;
            assembler
                .push(record)
                .map_err(|e| e.with_context(line_number, line))?;
        }

        assembler.finish()
    }

    /// Parses a whole lockbox file from a reader.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<LockboxFile> {
        let lines: Vec<String> = reader.lines().collect::<std::io::Result<_>>()?;
        Self::from_lines(lines)
    }

    /// Runs the full consistency pass over every lockbox (and therefore
    /// every batch). Batches were already validated eagerly at assembly
    /// time; the checks are exact and idempotent, so repeating them here is
    /// deliberate.
    pub fn validate(&self) -> Result<()> {
        for lockbox in &self.lockboxes {
            lockbox.validate()?;
        }

        Ok(())
    }

    /// Every check in the file, flattened across all lockboxes and batches.
    /// A pure read-only derivation with no validation side effects.
    pub fn checks(&self) -> Vec<Check> {
        self.lockboxes
            .iter()
            .flat_map(Lockbox::checks)
            .collect()
    }

    /// Writes the check projection as CSV, one row per check, header row
    /// included even when the file holds no checks.
    pub fn write_checks_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        csv_writer.write_record([
            "sender",
            "recipient",
            "date",
            "number",
            "amount",
            "memo",
            "sender_routing_number",
            "sender_account_number",
        ])?;

        for check in self.checks() {
            csv_writer.serialize(&check)?;
        }

        csv_writer.flush().map_err(crate::error::LockboxError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{BatchTotalRecord, DetailRecord};

    fn detail(amount_cents: u64) -> Detail {
        let line = format!(
            "6001001{:0>10}05500270700123455550000000180051616{:<30}{}",
            amount_cents, "BOB E SMITH", "MY BUSINESS COMPANY"
        );
        Detail::new(DetailRecord::decode(&line).unwrap())
    }

    fn batch_total(remittances: u64, cents: u64) -> BatchTotalRecord {
        let line = format!("70010000022222160523{:0>3}{:0>10}", remittances, cents);
        BatchTotalRecord::decode(&line).unwrap()
    }

    #[test]
    fn test_batch_totals_match() {
        let batch = Batch {
            details: vec![detail(700000)],
            summary: batch_total(1, 700000),
        };
        assert!(batch.validate().is_ok());
    }

    #[test]
    fn test_batch_dollar_total_mismatch() {
        let batch = Batch {
            details: vec![detail(700000)],
            summary: batch_total(1, 700001),
        };
        let err = batch.validate().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Consistency(_)));
        let msg = err.to_string();
        assert!(msg.contains("7000.00"), "{}", msg);
        assert!(msg.contains("7000.01"), "{}", msg);
    }

    #[test]
    fn test_batch_remittance_count_mismatch() {
        let batch = Batch {
            details: vec![detail(350000), detail(350000)],
            summary: batch_total(3, 700000),
        };
        let err = batch.validate().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Consistency(_)));
        assert!(err.to_string().contains("remittances"));
    }

    #[test]
    fn test_memo_concatenates_fragments_in_order() {
        let mut d = detail(700000);
        d.push_overflow(
            crate::record::DetailOverflowRecord::decode("40010016019CE554").unwrap(),
        );
        d.push_overflow(
            crate::record::DetailOverflowRecord::decode("40010016029-PART TWO").unwrap(),
        );
        assert_eq!(d.memo(), "CE554-PART TWO");
    }

    #[test]
    fn test_memo_empty_without_overflows() {
        assert_eq!(detail(700000).memo(), "");
    }
}
