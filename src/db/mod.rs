// SPDX-License-Identifier: MIT

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const UPLOADS: &str = "activity_uploads";
    pub const ACTIVITIES: &str = "completed_activities";
    pub const LINKS: &str = "session_activity_links";
    /// Owned by the plan/calendar subsystem; read-only here.
    pub const SESSIONS: &str = "planned_sessions";
}
