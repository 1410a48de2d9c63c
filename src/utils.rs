//! Utility functions for the ladder service

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique recompute run ID
pub fn generate_run_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Key used for case-insensitive name comparison
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Check whether two display names collide
pub fn names_collide(left: &str, right: &str) -> bool {
    name_key(left) == name_key(right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique_ids() {
        let id1 = generate_run_id();
        let id2 = generate_run_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_names_collide() {
        assert!(names_collide("Ana", "ana"));
        assert!(names_collide("  Bruno ", "BRUNO"));
        assert!(!names_collide("Ana", "Anabel"));
    }
}
