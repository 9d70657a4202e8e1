//! Hierarchical assembly of decoded records into the document tree.
//!
//! The file grammar is enforced by an explicit state machine whose
//! transitions consume the old state and produce the new one. Per scope
//! level the state holds either nothing or an owned in-progress builder, so
//! there is never shared mutable aliasing of a partially built tree.
//!
//! File scope: `AwaitingHeader → AwaitingService → (AwaitingLockboxOrTrailer
//! ⇄ WithinLockbox) → Closed`. Inside an open lockbox, a [`BatchBuilder`]
//! accumulates details (and their trailing overflow records) until the batch
//! total record arrives; batch consistency is validated eagerly at that
//! point, before the batch is ever considered part of the lockbox.

use crate::error::{ErrorKind, LockboxError, Result};
use crate::file::{Batch, Detail, Lockbox, LockboxFile};
use crate::record::{
    BatchTotalRecord, DetailHeader, DetailOverflowRecord, DetailRecord, Record, ServiceTotalRecord,
};
use log::debug;
use std::mem;

fn structure(msg: &str) -> LockboxError {
    LockboxError::new(ErrorKind::Structure(msg.to_string()))
}

/// Accumulates one batch's details until its batch total record arrives.
#[derive(Debug, Default)]
struct BatchBuilder {
    details: Vec<Detail>,
    current: Option<Detail>,
}

impl BatchBuilder {
    /// True if no detail has ever been attached to this batch.
    fn is_untouched(&self) -> bool {
        self.details.is_empty() && self.current.is_none()
    }

    fn push_detail(&mut self, record: DetailRecord) {
        if let Some(done) = self.current.take() {
            self.details.push(done);
        }
        self.current = Some(Detail::new(record));
    }

    fn push_overflow(&mut self, record: DetailOverflowRecord) -> Result<()> {
        match &mut self.current {
            Some(detail) => {
                detail.push_overflow(record);
                Ok(())
            }
            None => Err(structure("expected detail record before overflow record")),
        }
    }

    /// Flushes the pending detail, attaches the summary, and runs batch
    /// consistency validation. A failure here aborts before the batch is
    /// ever appended to the lockbox.
    fn close(mut self, summary: BatchTotalRecord) -> Result<Batch> {
        if let Some(done) = self.current.take() {
            self.details.push(done);
        }

        let batch = Batch {
            details: self.details,
            summary,
        };
        batch.validate()?;
        Ok(batch)
    }
}

/// Accumulates one lockbox's closed batches until its service total record
/// arrives.
#[derive(Debug)]
struct LockboxBuilder {
    header: DetailHeader,
    batches: Vec<Batch>,
    current_batch: BatchBuilder,
}

impl LockboxBuilder {
    fn new(header: DetailHeader) -> Self {
        LockboxBuilder {
            header,
            batches: Vec::new(),
            current_batch: BatchBuilder::default(),
        }
    }

    fn push_detail(&mut self, record: DetailRecord) {
        self.current_batch.push_detail(record);
    }

    fn push_overflow(&mut self, record: DetailOverflowRecord) -> Result<()> {
        self.current_batch.push_overflow(record)
    }

    fn close_batch(&mut self, summary: BatchTotalRecord) -> Result<()> {
        let builder = mem::take(&mut self.current_batch);
        let batch = builder.close(summary)?;
        debug!(
            "closed batch {} with {} detail(s), total {}",
            batch.summary.batch_number,
            batch.details.len(),
            batch.summary.check_dollar_total,
        );
        self.batches.push(batch);
        Ok(())
    }

    /// Closes the lockbox. A batch still holding details without its own
    /// batch total record is a structure error; an untouched empty current
    /// batch is simply discarded.
    fn close(self, total_record: ServiceTotalRecord) -> Result<Lockbox> {
        if !self.current_batch.is_untouched() {
            return Err(structure("batch total record expected"));
        }

        debug!(
            "closed lockbox {} with {} batch(es)",
            total_record.lockbox_number,
            self.batches.len(),
        );

        Ok(Lockbox {
            header: self.header,
            batches: self.batches,
            total_record,
        })
    }
}

/// File-scope assembly state. Transitions consume the state they leave.
#[derive(Debug)]
enum FileState {
    AwaitingHeader,
    AwaitingService {
        header: crate::record::ImmediateAddressHeader,
    },
    AwaitingLockboxOrTrailer {
        header: crate::record::ImmediateAddressHeader,
        service: crate::record::ServiceRecord,
        lockboxes: Vec<Lockbox>,
    },
    WithinLockbox {
        header: crate::record::ImmediateAddressHeader,
        service: crate::record::ServiceRecord,
        lockboxes: Vec<Lockbox>,
        lockbox: LockboxBuilder,
    },
    Closed {
        file: LockboxFile,
    },
}

impl FileState {
    fn push(self, record: Record) -> Result<FileState> {
        match record {
            Record::ImmediateAddressHeader(rec) => match self {
                FileState::AwaitingHeader => Ok(FileState::AwaitingService { header: rec }),
                FileState::Closed { .. } => {
                    Err(structure("unexpected record after destination trailer"))
                }
                _ => Err(structure("only one immediate address header per file")),
            },

            Record::Service(rec) => match self {
                FileState::AwaitingHeader => Err(structure("expected immediate address header")),
                FileState::AwaitingService { header } => Ok(FileState::AwaitingLockboxOrTrailer {
                    header,
                    service: rec,
                    lockboxes: Vec::new(),
                }),
                FileState::Closed { .. } => {
                    Err(structure("unexpected record after destination trailer"))
                }
                _ => Err(structure("only one service record per file")),
            },

            Record::DetailHeader(rec) => match self {
                FileState::AwaitingLockboxOrTrailer {
                    header,
                    service,
                    lockboxes,
                } => Ok(FileState::WithinLockbox {
                    header,
                    service,
                    lockboxes,
                    lockbox: LockboxBuilder::new(rec),
                }),
                FileState::WithinLockbox { .. } => Err(structure(
                    "cannot have lockbox detail header before closing the current one",
                )),
                FileState::Closed { .. } => {
                    Err(structure("unexpected record after destination trailer"))
                }
                _ => Err(structure("expected service record")),
            },

            Record::Detail(rec) => match self {
                FileState::WithinLockbox {
                    header,
                    service,
                    lockboxes,
                    mut lockbox,
                } => {
                    lockbox.push_detail(rec);
                    Ok(FileState::WithinLockbox {
                        header,
                        service,
                        lockboxes,
                        lockbox,
                    })
                }
                FileState::Closed { .. } => {
                    Err(structure("unexpected record after destination trailer"))
                }
                _ => Err(structure("expected lockbox detail header")),
            },

            Record::DetailOverflow(rec) => match self {
                FileState::WithinLockbox {
                    header,
                    service,
                    lockboxes,
                    mut lockbox,
                } => {
                    lockbox.push_overflow(rec)?;
                    Ok(FileState::WithinLockbox {
                        header,
                        service,
                        lockboxes,
                        lockbox,
                    })
                }
                FileState::Closed { .. } => {
                    Err(structure("unexpected record after destination trailer"))
                }
                _ => Err(structure("expected lockbox detail header")),
            },

            Record::BatchTotal(rec) => match self {
                FileState::WithinLockbox {
                    header,
                    service,
                    lockboxes,
                    mut lockbox,
                } => {
                    lockbox.close_batch(rec)?;
                    Ok(FileState::WithinLockbox {
                        header,
                        service,
                        lockboxes,
                        lockbox,
                    })
                }
                FileState::Closed { .. } => {
                    Err(structure("unexpected record after destination trailer"))
                }
                _ => Err(structure("expected lockbox detail header")),
            },

            Record::ServiceTotal(rec) => match self {
                FileState::WithinLockbox {
                    header,
                    service,
                    mut lockboxes,
                    lockbox,
                } => {
                    lockboxes.push(lockbox.close(rec)?);
                    Ok(FileState::AwaitingLockboxOrTrailer {
                        header,
                        service,
                        lockboxes,
                    })
                }
                FileState::Closed { .. } => {
                    Err(structure("unexpected record after destination trailer"))
                }
                _ => Err(structure("expected lockbox detail header")),
            },

            Record::DestinationTrailer(rec) => match self {
                FileState::AwaitingLockboxOrTrailer {
                    header,
                    service,
                    lockboxes,
                } => Ok(FileState::Closed {
                    file: LockboxFile {
                        header_record: header,
                        service_record: service,
                        lockboxes,
                        destination_trailer_record: rec,
                    },
                }),
                FileState::AwaitingHeader => Err(structure("expected immediate address header")),
                FileState::AwaitingService { .. } => Err(structure("expected service record")),
                FileState::WithinLockbox { .. } => Err(structure("expected batch total record")),
                FileState::Closed { .. } => Err(structure("unexpected destination trailer")),
            },
        }
    }
}

/// Consumes the ordered record sequence and builds the document tree.
///
/// Fail-fast: after the first error the assembler is spent and must not be
/// fed further records.
#[derive(Debug)]
pub struct Assembler {
    state: FileState,
}

impl Assembler {
    pub fn new() -> Self {
        Assembler {
            state: FileState::AwaitingHeader,
        }
    }

    /// Feeds one decoded record through the grammar.
    pub fn push(&mut self, record: Record) -> Result<()> {
        debug!("consuming {}", record.variant_name());
        let state = mem::replace(&mut self.state, FileState::AwaitingHeader);
        self.state = state.push(record)?;
        Ok(())
    }

    /// Ends the record sequence. The trailer must have been consumed and no
    /// lockbox may still be open; then the full consistency pass runs over
    /// the assembled tree.
    pub fn finish(self) -> Result<LockboxFile> {
        match self.state {
            FileState::Closed { file } => {
                file.validate()?;
                Ok(file)
            }
            FileState::WithinLockbox { .. } => Err(structure("expected service total record")),
            _ => Err(structure("expected destination trailer record")),
        }
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}
