//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{DeletedUserData, FirestoreDb};

/// Collection names as constants.
pub mod collections {
    pub const PROFILES: &str = "profiles";
    pub const POSTS: &str = "posts";
    pub const SPOTS: &str = "spots";
}
