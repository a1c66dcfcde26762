//! # shellhub-registry
//!
//! Durable CRUD over shell and submodel descriptors without an external
//! database.
//!
//! This crate provides:
//! - `DescriptorStore`: the registry operations, each returning an `Outcome`
//! - `ShellLayout`: the identifier → directory/file mapping
//! - atomic single-record JSON reads/writes
//! - per-shell write serialization (`KeyLocks`)
//!
//! ## On-disk layout
//!
//! ```text
//! <root>/
//!   <sha256(shellId)>/
//!     <sha256(shellId)>.json      shell record, submodel list cleared
//!     Submodels/
//!       <idShort>.json            one record per submodel
//! ```
//!
//! Multi-record sequences (a shell plus its submodels) are not atomic as a
//! whole: a failure part-way leaves earlier records in place and reports the
//! first failing record.

pub mod layout;
pub mod locks;
pub mod record;
pub mod store;

pub use layout::{SUBMODEL_FOLDER, ShellLayout};
pub use locks::KeyLocks;
pub use record::{RecordError, read_record, write_record};
pub use store::DescriptorStore;
