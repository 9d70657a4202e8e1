//! # BAI Lockbox Parser
//!
//! A parser and consistency validator for the BAI lockbox transmission
//! format: fixed-width files in which a bank reports deposited paper checks
//! back to a merchant.
//!
//! ## Design Principles
//!
//! - **Fixed-point arithmetic**: amounts are integer cents scaled to 2
//!   decimal places via `rust_decimal`; totals are compared exactly
//! - **Fail-fast**: the first malformed field, grammar violation, or total
//!   mismatch aborts the parse; there is never a partially built file
//! - **Typed errors with context**: every failure keeps its original kind
//!   and gains the 1-based line number and raw line text once
//! - **Declarative layouts**: each record variant's byte layout is a `const`
//!   table checked by tests for contiguous, non-overlapping offsets
//!
//! ## Example
//!
//! ```no_run
//! use bai_lockbox::LockboxFile;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! let reader = BufReader::new(File::open("deposits.bai").unwrap());
//! let file = LockboxFile::from_reader(reader).unwrap();
//! for check in file.checks() {
//!     println!("{} paid {}", check.sender, check.amount);
//! }
//! ```

pub mod assembler;
pub mod check;
pub mod error;
pub mod file;
pub mod money;
pub mod record;
pub mod schema;

pub use assembler::Assembler;
pub use check::Check;
pub use error::{ErrorClass, ErrorKind, LineContext, LockboxError, Result};
pub use file::{Batch, Detail, Lockbox, LockboxFile};
pub use money::Amount;
pub use record::Record;
pub use schema::{FieldClass, FieldSpec, MAX_RECORD_LEN, NOMINAL_RECORD_LEN};
