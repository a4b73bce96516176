//! osz-processor: turn `.osz` beatmap archives into validated mapset records
//!
//! An archive is extracted into a temporary directory, every member is hashed
//! and classified by extension, each `.osu` member is parsed with
//! [`osu_parser`], and the result is aggregated into a [`MapsetRecord`] and
//! checked by [`validate`].

pub mod error;
pub mod hash;
pub mod classify;
pub mod types;
mod archive;
pub mod processor;
pub mod validate;

pub use classify::MemberRole;
pub use error::{ProcessError, Result};
pub use hash::content_hash;
pub use processor::{OszProcessor, ProcessOptions, ProcessedMapset};
pub use types::{ArchiveMember, MapsetRecord};
pub use validate::validate;
