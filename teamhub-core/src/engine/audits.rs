//! Audit log queries.

use super::visibility::{audit_view, require_admin};
use super::Engine;
use crate::error::{Error, Result};
use crate::models::{AuditLog, ListFilter, ListPage};

impl Engine {
    /// Lists audit entries (admin only)
    ///
    /// Filters: `keyword` on the entry content, the inclusive creation-time
    /// window, and `order_by` of `created_at` (default, ascending) or
    /// `-created_at`. Any other sort key is `Invalid`.
    pub async fn list_audits(&self, actor: i64, filter: &ListFilter) -> Result<ListPage<AuditLog>> {
        let state = self.read().await;
        require_admin(&state, actor, "read the audit log")?;

        let mut entries: Vec<AuditLog> = state
            .audits
            .iter()
            .filter(|a| filter.matches_keyword(&a.content))
            .filter(|a| filter.matches_time(a.created_at.timestamp()))
            .map(audit_view)
            .collect();

        match filter.order_by.as_deref() {
            None | Some("created_at") => {}
            Some("-created_at") => entries.reverse(),
            Some(other) => {
                return Err(Error::Invalid(format!("unknown sort key {}", other)));
            }
        }

        Ok(filter.paginate(entries))
    }

    #[cfg(test)]
    pub(crate) async fn record_audit_for_test(&self, content: &str) {
        let mut state = self.write().await;
        super::visibility::record_audit(&mut state, content.to_string());
    }
}
