// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod ingest;
pub mod matching;

pub use ingest::{IngestOutcome, UploadDetail, UploadProcessor};
pub use matching::{pick_auto_match, score_candidate, MatchCandidate, MatchInput, ScoredCandidate};
