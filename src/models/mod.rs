// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod activity;
pub mod link;
pub mod session;
pub mod upload;

pub use activity::{CompletedActivity, ParseSummary, ParsedActivity, Sport};
pub use link::{ActivityLink, LinkType, ScoreBreakdown};
pub use session::PlannedSession;
pub use upload::{FileFormat, UploadStatus, UploadedFile};
