//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{BookingFilter, FirestoreDb};

/// Collection names as constants.
pub mod collections {
    /// User profiles (keyed by user_id)
    pub const PROFILES: &str = "profiles";
    /// Password hashes (keyed by url-encoded lowercase e-mail)
    pub const CREDENTIALS: &str = "credentials";
    pub const CLASSES: &str = "classes";
    pub const COURTS: &str = "courts";
    pub const EQUIPMENT: &str = "equipment";
    pub const BOOKINGS: &str = "bookings";
    pub const BOOKING_STATUS_HISTORY: &str = "booking_status_history";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const TIME_BLOCKS: &str = "time_blocks";
    pub const EQUIPMENT_ISSUES: &str = "equipment_issues";
}
