// SPDX-License-Identifier: MIT

//! Upload ingestion pipeline.
//!
//! One upload is one linear unit of work run inside the request:
//! validate -> hash -> dedup check -> persist -> parse -> persist-or-error
//! -> fetch candidates -> score -> decide -> link-or-leave-unlinked.
//! Manual attach is a separate idempotent operation that can run at any
//! later time and always supersedes an existing link.

use chrono::Duration;
use futures_util::{stream, StreamExt, TryStreamExt};

use crate::config::MAX_UPLOAD_BYTES;
use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{
    upload::sha256_hex, ActivityLink, CompletedActivity, FileFormat, LinkType, PlannedSession,
    UploadStatus, UploadedFile,
};
use crate::parsers::parse_activity;
use crate::services::matching::{
    pick_auto_match, score_candidate, MatchCandidate, MatchInput, ScoredCandidate,
};

/// Candidate planned sessions are fetched in this window around the
/// activity start; the time sub-score zeroes out anything farther away.
const CANDIDATE_WINDOW_HOURS: i64 = 6;

/// Cap on concurrent Firestore lookups when joining upload details.
const MAX_CONCURRENT_DB_OPS: usize = 8;

/// Outcome of one ingestion run, shaped for the upload endpoint.
#[derive(Debug)]
pub enum IngestOutcome {
    /// Identical bytes were already uploaded by this user.
    Duplicate {
        upload_id: String,
        status: UploadStatus,
    },
    /// Parsed and persisted; `matched` reports whether auto-matching linked it.
    Completed {
        upload_id: String,
        activity_id: String,
        matched: bool,
    },
    /// The upload row exists with status `error`; no activity was created.
    ParseFailed { upload_id: String, message: String },
}

/// Upload joined with its activity and link, for listing endpoints.
#[derive(Debug)]
pub struct UploadDetail {
    pub upload: UploadedFile,
    pub activity: Option<CompletedActivity>,
    pub link: Option<ActivityLink>,
}

/// Runs the intake pipeline and the manual-attach override.
pub struct UploadProcessor {
    db: FirestoreDb,
}

impl UploadProcessor {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Ingest one uploaded file end to end.
    ///
    /// Validation errors (extension, size) surface as `AppError::Validation`
    /// before anything is hashed or stored. Parse failures are converted to
    /// an [`IngestOutcome::ParseFailed`] with the upload kept at status
    /// `error`; they never abort the request with a 5xx.
    pub async fn process_upload(
        &self,
        user_id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<IngestOutcome> {
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::Validation(
                "File is too large. Max size is 20MB.".to_string(),
            ));
        }
        let format = FileFormat::from_filename(filename).ok_or_else(|| {
            AppError::Validation("Unsupported file type. Please upload .fit or .tcx".to_string())
        })?;

        // Dedup gate: hash before parsing, short-circuit on a hit.
        let sha256 = sha256_hex(bytes);
        if let Some(existing) = self.db.find_upload_by_hash(user_id, &sha256).await? {
            tracing::info!(user_id, upload_id = %existing.id, "Duplicate upload short-circuited");
            return Ok(IngestOutcome::Duplicate {
                upload_id: existing.id,
                status: existing.status,
            });
        }

        let upload = UploadedFile::new(user_id, filename, format, bytes);
        if !self.db.create_upload(&upload).await? {
            // Lost a race against a concurrent identical upload; the
            // create-only write guarantees exactly one winner.
            let existing = self
                .db
                .find_upload_by_hash(user_id, &sha256)
                .await?
                .ok_or_else(|| {
                    AppError::Database("Upload conflicted but is not readable".to_string())
                })?;
            tracing::info!(user_id, upload_id = %existing.id, "Concurrent duplicate upload");
            return Ok(IngestOutcome::Duplicate {
                upload_id: existing.id,
                status: existing.status,
            });
        }

        // Parse strictly after the upload row is durable, so a crash here
        // never silently loses the upload.
        let parsed = match parse_activity(format, bytes) {
            Ok(parsed) => parsed,
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(user_id, upload_id = %upload.id, error = %message, "Parse failed");
                self.db
                    .update_upload_status(
                        user_id,
                        &upload.id,
                        UploadStatus::Error,
                        Some(&message),
                    )
                    .await?;
                return Ok(IngestOutcome::ParseFailed {
                    upload_id: upload.id,
                    message,
                });
            }
        };

        let activity = CompletedActivity::from_parsed(&upload, parsed);
        self.db.create_activity(&activity).await?;
        self.db
            .update_upload_status(user_id, &upload.id, UploadStatus::Parsed, None)
            .await?;

        let matched = self.run_matching(&activity).await?;
        if matched {
            self.db
                .update_upload_status(user_id, &upload.id, UploadStatus::Matched, None)
                .await?;
        }

        tracing::info!(
            user_id,
            upload_id = %upload.id,
            sport = %activity.sport,
            matched,
            "Upload ingested"
        );

        Ok(IngestOutcome::Completed {
            upload_id: upload.id,
            activity_id: activity.id,
            matched,
        })
    }

    /// Score candidates around the activity start and link the winner.
    /// Returns whether a link was created; an ambiguous or low-confidence
    /// field leaves the activity unassigned.
    async fn run_matching(&self, activity: &CompletedActivity) -> Result<bool> {
        let window = Duration::hours(CANDIDATE_WINDOW_HOURS);
        let from = (activity.start_time_utc - window).date_naive();
        let to = (activity.start_time_utc + window).date_naive();

        let sessions: Vec<PlannedSession> = self
            .db
            .get_planned_sessions_in_range(&activity.user_id, from, to)
            .await?;

        let input = MatchInput::from(activity);
        let scored: Vec<ScoredCandidate> = sessions
            .iter()
            .map(|session| score_candidate(&input, &MatchCandidate::from_session(session)))
            .collect();

        let Some(best) = pick_auto_match(&scored) else {
            tracing::info!(
                activity_id = %activity.id,
                candidates = scored.len(),
                "No auto-match; activity left unassigned"
            );
            return Ok(false);
        };

        let link = ActivityLink {
            user_id: activity.user_id.clone(),
            completed_activity_id: activity.id.clone(),
            planned_session_id: best.session_id.clone(),
            link_type: LinkType::Auto,
            confidence: round2(best.confidence),
            match_reason: Some(best.breakdown),
            created_at: chrono::Utc::now(),
        };
        self.db.replace_link(&link).await?;

        tracing::info!(
            activity_id = %activity.id,
            session_id = %best.session_id,
            confidence = link.confidence,
            "Auto-matched activity to planned session"
        );
        Ok(true)
    }

    /// Manual attach: force-link an activity to a chosen session.
    ///
    /// Ownership is enforced on both lookups, and the two NotFound cases
    /// stay distinguishable. Replacing the link document makes "last
    /// decision wins" atomic, so re-invoking with the same target is safe.
    pub async fn attach(
        &self,
        user_id: &str,
        upload_id: &str,
        planned_session_id: &str,
    ) -> Result<()> {
        let activity = self
            .db
            .get_activity_for_upload(user_id, upload_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Activity not found".to_string()))?;

        let session = self
            .db
            .get_planned_session(user_id, planned_session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Planned session not found".to_string()))?;

        let link = ActivityLink::manual(user_id, &activity.id, &session.id);
        self.db.replace_link(&link).await?;
        self.db
            .update_upload_status(user_id, upload_id, UploadStatus::Matched, None)
            .await?;

        tracing::info!(
            user_id,
            upload_id,
            session_id = %session.id,
            "Manually attached activity to planned session"
        );
        Ok(())
    }

    /// Recent uploads with their activity and link, newest first.
    pub async fn recent_uploads(&self, user_id: &str, limit: u32) -> Result<Vec<UploadDetail>> {
        let uploads = self.db.list_uploads_for_user(user_id, limit).await?;

        // Join lookups run concurrently; `buffered` keeps the query order.
        stream::iter(uploads)
            .map(|upload| self.join_detail(user_id, upload))
            .buffered(MAX_CONCURRENT_DB_OPS)
            .try_collect()
            .await
    }

    /// One upload with its activity and link.
    pub async fn upload_detail(&self, user_id: &str, upload_id: &str) -> Result<UploadDetail> {
        let upload = self
            .db
            .get_upload(user_id, upload_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Upload not found".to_string()))?;
        self.join_detail(user_id, upload).await
    }

    async fn join_detail(&self, user_id: &str, upload: UploadedFile) -> Result<UploadDetail> {
        let activity = self.db.get_activity_for_upload(user_id, &upload.id).await?;
        let link = match &activity {
            Some(activity) => self.db.get_link_for_activity(user_id, &activity.id).await?,
            None => None,
        };
        Ok(UploadDetail {
            upload,
            activity,
            link,
        })
    }
}

/// Stored confidence is rounded to two decimals, matching what the
/// decision was made on closely enough for display and audit.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.8666666), 0.87);
        assert_eq!(round2(1.0), 1.0);
        assert_eq!(round2(0.0), 0.0);
    }
}
