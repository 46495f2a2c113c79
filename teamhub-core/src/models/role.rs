//! Role model.

use serde::{Deserialize, Serialize};

/// Role kind: seeded and immutable, or admin-defined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleKind {
    /// One of the three seeded roles (`admin`, `team leader`, `normal user`).
    /// Never created, deleted, or manually (re)assigned.
    System,

    /// Admin-defined label with no built-in behavior
    Custom,
}

/// A role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Unique role ID
    pub id: i64,

    /// Role name
    pub name: String,

    /// System or Custom
    #[serde(rename = "type")]
    pub kind: RoleKind,

    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_kind_wire_names() {
        let role = Role {
            id: 1,
            name: "admin".to_string(),
            kind: RoleKind::System,
            desc: None,
        };
        let json = serde_json::to_value(&role).unwrap();
        assert_eq!(json["type"], "System");

        let parsed: Role = serde_json::from_value(serde_json::json!({
            "id": 4, "name": "qa", "type": "Custom"
        }))
        .unwrap();
        assert_eq!(parsed.kind, RoleKind::Custom);
    }
}
