use uuid::Uuid;

/// Allocates an id for a node whose template did not carry one.
pub fn fresh_id() -> String { Uuid::new_v4().to_string() }
