// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Uploads (dedup-gated file records)
//! - Completed activities (parsed uploads, 1:1 with their upload)
//! - Activity links (at most one per activity)
//! - Planned sessions (read-only candidate queries)
//!
//! Uniqueness invariants are enforced with deterministic document IDs:
//! uploads are keyed by `(owner, hash)` and written create-only, links
//! are keyed by activity ID so a write replaces the previous link.

use chrono::NaiveDate;

use crate::db::collections;
use crate::error::AppError;
use crate::models::{ActivityLink, CompletedActivity, PlannedSession, UploadStatus, UploadedFile};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Upload Operations ───────────────────────────────────────

    /// Look up an upload by its dedup hash for one user.
    ///
    /// The document ID encodes `(owner, hash)`, so this is a point read.
    pub async fn find_upload_by_hash(
        &self,
        user_id: &str,
        sha256: &str,
    ) -> Result<Option<UploadedFile>, AppError> {
        let doc_id = UploadedFile::document_id(user_id, sha256);
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::UPLOADS)
            .obj()
            .one(&doc_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an upload by ID, enforcing ownership.
    pub async fn get_upload(
        &self,
        user_id: &str,
        upload_id: &str,
    ) -> Result<Option<UploadedFile>, AppError> {
        let upload: Option<UploadedFile> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::UPLOADS)
            .obj()
            .one(upload_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(upload.filter(|u| u.user_id == user_id))
    }

    /// Create an upload record with create-only semantics.
    ///
    /// Returns `false` if a document with the same `(owner, hash)` ID
    /// already exists — the storage-level guarantee that two simultaneous
    /// identical uploads yield exactly one winner.
    pub async fn create_upload(&self, upload: &UploadedFile) -> Result<bool, AppError> {
        let result: Result<UploadedFile, _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::UPLOADS)
            .document_id(&upload.id)
            .object(upload)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Advance an upload's lifecycle status, setting or clearing the
    /// error message. Fetch-modify-write to preserve the other fields.
    pub async fn update_upload_status(
        &self,
        user_id: &str,
        upload_id: &str,
        status: UploadStatus,
        error_message: Option<&str>,
    ) -> Result<(), AppError> {
        let mut upload = self
            .get_upload(user_id, upload_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Upload {} not found", upload_id)))?;

        upload.status = status;
        upload.error_message = error_message.map(str::to_string);

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::UPLOADS)
            .document_id(upload_id)
            .object(&upload)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get recent uploads for a user, newest first.
    pub async fn list_uploads_for_user(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<UploadedFile>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::UPLOADS)
            .filter(move |q| q.field("user_id").eq(user_id.clone()))
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Completed Activity Operations ───────────────────────────

    /// Store a completed activity (document ID equals the upload ID).
    pub async fn create_activity(&self, activity: &CompletedActivity) -> Result<(), AppError> {
        let _: CompletedActivity = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::ACTIVITIES)
            .document_id(&activity.id)
            .object(activity)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get the activity created from an upload, enforcing ownership.
    /// A failed parse has no activity, so this returns `None` for it.
    pub async fn get_activity_for_upload(
        &self,
        user_id: &str,
        upload_id: &str,
    ) -> Result<Option<CompletedActivity>, AppError> {
        let activity: Option<CompletedActivity> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACTIVITIES)
            .obj()
            .one(upload_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(activity.filter(|a| a.user_id == user_id))
    }

    // ─── Planned Session Operations (read-only) ──────────────────

    /// Get a planned session by ID, enforcing ownership.
    pub async fn get_planned_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<PlannedSession>, AppError> {
        let session: Option<PlannedSession> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SESSIONS)
            .obj()
            .one(session_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(session.filter(|s| s.user_id == user_id))
    }

    /// Candidate query: a user's planned sessions in a date range
    /// (inclusive). Only the matching engine consumes these.
    pub async fn get_planned_sessions_in_range(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PlannedSession>, AppError> {
        let user_id = user_id.to_string();
        let from = from.to_string();
        let to = to.to_string();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::SESSIONS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("date").greater_than_or_equal(from.clone()),
                    q.field("date").less_than_or_equal(to.clone()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Activity Link Operations ────────────────────────────────

    /// Get the link for an activity, if any, enforcing ownership.
    pub async fn get_link_for_activity(
        &self,
        user_id: &str,
        activity_id: &str,
    ) -> Result<Option<ActivityLink>, AppError> {
        let link: Option<ActivityLink> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::LINKS)
            .obj()
            .one(activity_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(link.filter(|l| l.user_id == user_id))
    }

    /// Insert or replace the link for an activity.
    ///
    /// The document ID is the activity ID, so this is a native
    /// upsert-on-conflict: the previous link (auto or manual) is replaced
    /// atomically and at most one link per activity ever exists, even
    /// under concurrent attach calls.
    pub async fn replace_link(&self, link: &ActivityLink) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::LINKS)
            .document_id(&link.completed_activity_id)
            .object(link)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Test Seeding ────────────────────────────────────────────

    /// Seed a planned session. The plan subsystem owns this collection in
    /// production; this exists for emulator-backed integration tests.
    pub async fn seed_planned_session(&self, session: &PlannedSession) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SESSIONS)
            .document_id(&session.id)
            .object(session)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
