//! Mapping matched hosts to system roles.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::error::{AuthError, Result};
use crate::registry::RoleMap;

/// Scope a role is granted in. This plugin only grants system-wide roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleScope {
    #[default]
    System,
}

impl fmt::Display for RoleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleScope::System => write!(f, "system"),
        }
    }
}

/// The host system's role assignment API.
///
/// Assigning a role a user already holds must be a no-op; this crate never
/// checks before calling.
#[async_trait]
pub trait RoleAssigner: Send + Sync {
    async fn assign_role(
        &self,
        role_id: &str,
        user_id: &str,
        scope: RoleScope,
    ) -> std::result::Result<(), String>;
}

/// Decides whether and which role to assign after a successful login.
pub struct RoleResolver {
    assigner: Arc<dyn RoleAssigner>,
}

impl RoleResolver {
    pub fn new(assigner: Arc<dyn RoleAssigner>) -> Self {
        Self { assigner }
    }

    /// Assign the role mapped to `matched_index`, if any.
    ///
    /// Returns the role that was assigned. Nothing is assigned when the
    /// index has no role or its role is the "no role" sentinel. A failed
    /// assignment is returned as [`AuthError::RoleAssignment`] and is not
    /// retried.
    pub async fn resolve_and_assign(
        &self,
        roles: &RoleMap,
        matched_index: usize,
        user_id: &str,
    ) -> Result<Option<String>> {
        let Some(role_id) = roles.assignable(matched_index) else {
            debug!(
                "No role to assign for host {} (user {})",
                matched_index, user_id
            );
            return Ok(None);
        };

        match self
            .assigner
            .assign_role(role_id, user_id, RoleScope::System)
            .await
        {
            Ok(()) => {
                info!(
                    "Assigned role {} to user {} for host {}",
                    role_id, user_id, matched_index
                );
                Ok(Some(role_id.to_string()))
            }
            Err(e) => {
                error!(
                    "Failed to assign role {} to user {}: {}",
                    role_id, user_id, e
                );
                Err(AuthError::RoleAssignment(e))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records every assignment request.
    #[derive(Default)]
    pub(crate) struct RecordingAssigner {
        pub(crate) calls: Mutex<Vec<(String, String, RoleScope)>>,
        pub(crate) fail: bool,
    }

    impl RecordingAssigner {
        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub(crate) fn calls(&self) -> Vec<(String, String, RoleScope)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RoleAssigner for RecordingAssigner {
        async fn assign_role(
            &self,
            role_id: &str,
            user_id: &str,
            scope: RoleScope,
        ) -> std::result::Result<(), String> {
            self.calls
                .lock()
                .unwrap()
                .push((role_id.to_string(), user_id.to_string(), scope));
            if self.fail {
                return Err("role store offline".to_string());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingAssigner;
    use super::*;
    use crate::registry::NO_ROLE;

    fn roles(pairs: &[(usize, &str)]) -> RoleMap {
        pairs.iter().map(|(i, r)| (*i, r.to_string())).collect()
    }

    fn resolver(assigner: &Arc<RecordingAssigner>) -> RoleResolver {
        let assigner: Arc<dyn RoleAssigner> = assigner.clone();
        RoleResolver::new(assigner)
    }

    #[tokio::test]
    async fn test_assigns_mapped_role() {
        let assigner = Arc::new(RecordingAssigner::default());
        let roles = roles(&[(0, "10"), (1, "11")]);

        let assigned = resolver(&assigner)
            .resolve_and_assign(&roles, 1, "user-42")
            .await
            .unwrap();

        assert_eq!(assigned.as_deref(), Some("11"));
        assert_eq!(
            assigner.calls(),
            vec![("11".to_string(), "user-42".to_string(), RoleScope::System)]
        );
    }

    #[tokio::test]
    async fn test_sentinel_role_is_not_assigned() {
        let assigner = Arc::new(RecordingAssigner::default());
        let roles = roles(&[(0, "10"), (2, NO_ROLE)]);

        let assigned = resolver(&assigner)
            .resolve_and_assign(&roles, 2, "user-42")
            .await
            .unwrap();

        assert_eq!(assigned, None);
        assert!(assigner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_role_is_noop() {
        let assigner = Arc::new(RecordingAssigner::default());
        let roles = roles(&[(0, "10")]);

        let assigned = resolver(&assigner)
            .resolve_and_assign(&roles, 3, "user-42")
            .await
            .unwrap();

        assert_eq!(assigned, None);
        assert!(assigner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_assignment_failure_is_reported_once() {
        let assigner = Arc::new(RecordingAssigner::failing());
        let roles = roles(&[(0, "10")]);

        let result = resolver(&assigner)
            .resolve_and_assign(&roles, 0, "user-42")
            .await;

        assert!(matches!(result, Err(AuthError::RoleAssignment(_))));
        assert_eq!(assigner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_repeat_assignment_calls_again() {
        let assigner = Arc::new(RecordingAssigner::default());
        let roles = roles(&[(0, "10")]);
        let resolver = resolver(&assigner);

        resolver.resolve_and_assign(&roles, 0, "u").await.unwrap();
        resolver.resolve_and_assign(&roles, 0, "u").await.unwrap();

        assert_eq!(assigner.calls().len(), 2);
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(RoleScope::System.to_string(), "system");
    }
}
