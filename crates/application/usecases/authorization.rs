use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::domain::repositories::admins::AdminDirectoryRepository;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("admin privileges required")]
    Forbidden,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthzError {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            AuthzError::Forbidden => StatusCode::FORBIDDEN,
            AuthzError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// An authenticated caller, as established by the credential layer. The
/// credential layer has already rejected anonymous requests with 401; this
/// type only exists past that point.
#[derive(Debug, Clone)]
pub struct AdminPrincipal {
    pub uid: String,
    pub email: Option<String>,
    pub admin_claim: bool,
}

/// Per-mechanism breakdown. The three sources are not kept in sync by
/// anything; `in_sync` makes the drift observable instead of silent.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AdminAuthDiagnostic {
    pub allowlisted: bool,
    pub directory_active: bool,
    pub claim: bool,
}

impl AdminAuthDiagnostic {
    pub fn is_admin(&self) -> bool {
        self.allowlisted || self.directory_active || self.claim
    }

    pub fn in_sync(&self) -> bool {
        self.allowlisted == self.directory_active && self.directory_active == self.claim
    }
}

/// Single entry point for admin authorization. Composes the static
/// allow-list, the directory record and the token claim; any one passing is
/// sufficient.
pub struct AuthorizationService<A>
where
    A: AdminDirectoryRepository + Send + Sync + 'static,
{
    admin_repo: Arc<A>,
    allowlist: HashSet<String>,
}

impl<A> AuthorizationService<A>
where
    A: AdminDirectoryRepository + Send + Sync + 'static,
{
    pub fn new(admin_repo: Arc<A>, allowlist_emails: impl IntoIterator<Item = String>) -> Self {
        let allowlist = allowlist_emails
            .into_iter()
            .filter_map(|email| normalize_email(&email))
            .collect();

        Self {
            admin_repo,
            allowlist,
        }
    }

    /// Fails closed: no email, empty email and unlisted email are all false.
    pub fn is_allowlisted(&self, email: Option<&str>) -> bool {
        match email.and_then(normalize_email) {
            Some(normalized) => self.allowlist.contains(&normalized),
            None => false,
        }
    }

    /// Directory lookup by uid, then by normalized email. Only a record with
    /// `active = true` counts; an absent record is false, not an error.
    pub async fn is_directory_admin(&self, uid: &str, email: Option<&str>) -> Result<bool> {
        if let Some(record) = self.admin_repo.find_by_uid(uid).await? {
            return Ok(record.active);
        }

        if let Some(normalized) = email.and_then(normalize_email) {
            if let Some(record) = self.admin_repo.find_by_email(&normalized).await? {
                return Ok(record.active);
            }
        }

        Ok(false)
    }

    pub async fn authorize_admin(&self, principal: &AdminPrincipal) -> Result<(), AuthzError> {
        if principal.admin_claim {
            return Ok(());
        }

        if self.is_allowlisted(principal.email.as_deref()) {
            return Ok(());
        }

        if self
            .is_directory_admin(&principal.uid, principal.email.as_deref())
            .await
            .map_err(AuthzError::Internal)?
        {
            return Ok(());
        }

        warn!(
            uid = %principal.uid,
            "authorization: admin access denied on all three mechanisms"
        );
        Err(AuthzError::Forbidden)
    }

    pub async fn diagnose(&self, principal: &AdminPrincipal) -> Result<AdminAuthDiagnostic> {
        let allowlisted = self.is_allowlisted(principal.email.as_deref());
        let directory_active = self
            .is_directory_admin(&principal.uid, principal.email.as_deref())
            .await?;

        let diagnostic = AdminAuthDiagnostic {
            allowlisted,
            directory_active,
            claim: principal.admin_claim,
        };

        if diagnostic.is_admin() && !diagnostic.in_sync() {
            warn!(
                uid = %principal.uid,
                allowlisted,
                directory_active,
                claim = principal.admin_claim,
                "authorization: admin mechanisms disagree, claims need reconciliation"
            );
        }

        Ok(diagnostic)
    }
}

fn normalize_email(raw: &str) -> Option<String> {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::predicate::eq;

    use super::*;
    use crate::domain::{
        entities::admins::AdminDirectoryEntity,
        repositories::admins::MockAdminDirectoryRepository,
    };

    fn directory_record(uid: &str, email: &str, active: bool) -> AdminDirectoryEntity {
        AdminDirectoryEntity {
            uid: uid.to_string(),
            email: email.to_string(),
            active,
            created_at: Utc::now(),
        }
    }

    fn principal(uid: &str, email: Option<&str>, admin_claim: bool) -> AdminPrincipal {
        AdminPrincipal {
            uid: uid.to_string(),
            email: email.map(|e| e.to_string()),
            admin_claim,
        }
    }

    #[test]
    fn allowlist_check_normalizes_email() {
        let service = AuthorizationService::new(
            Arc::new(MockAdminDirectoryRepository::new()),
            vec!["Owner@Example.COM ".to_string()],
        );

        assert!(service.is_allowlisted(Some("  owner@example.com")));
        assert!(service.is_allowlisted(Some("OWNER@EXAMPLE.COM")));
        assert!(!service.is_allowlisted(Some("other@example.com")));
    }

    #[test]
    fn allowlist_check_fails_closed_on_missing_email() {
        let service = AuthorizationService::new(
            Arc::new(MockAdminDirectoryRepository::new()),
            vec!["owner@example.com".to_string()],
        );

        assert!(!service.is_allowlisted(None));
        assert!(!service.is_allowlisted(Some("   ")));
    }

    #[tokio::test]
    async fn inactive_directory_record_does_not_authorize() {
        let mut repo = MockAdminDirectoryRepository::new();
        repo.expect_find_by_uid()
            .with(eq("uid-1"))
            .returning(|_| {
                Box::pin(async { Ok(Some(directory_record("uid-1", "ex@example.com", false))) })
            });

        let service = AuthorizationService::new(Arc::new(repo), vec![]);
        let err = service
            .authorize_admin(&principal("uid-1", Some("ex@example.com"), false))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn any_single_mechanism_is_sufficient() {
        // Claim alone authorizes without touching the directory.
        let service = AuthorizationService::new(
            Arc::new(MockAdminDirectoryRepository::new()),
            vec![],
        );
        assert!(service
            .authorize_admin(&principal("uid-1", None, true))
            .await
            .is_ok());

        // Active directory record alone authorizes.
        let mut repo = MockAdminDirectoryRepository::new();
        repo.expect_find_by_uid()
            .with(eq("uid-2"))
            .returning(|_| {
                Box::pin(async { Ok(Some(directory_record("uid-2", "dir@example.com", true))) })
            });
        let service = AuthorizationService::new(Arc::new(repo), vec![]);
        assert!(service
            .authorize_admin(&principal("uid-2", None, false))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn directory_lookup_falls_back_to_email() {
        let mut repo = MockAdminDirectoryRepository::new();
        repo.expect_find_by_uid()
            .with(eq("new-uid"))
            .returning(|_| Box::pin(async { Ok(None) }));
        repo.expect_find_by_email()
            .with(eq("admin@example.com"))
            .returning(|_| {
                Box::pin(async { Ok(Some(directory_record("old-uid", "admin@example.com", true))) })
            });

        let service = AuthorizationService::new(Arc::new(repo), vec![]);
        assert!(service
            .is_directory_admin("new-uid", Some(" Admin@Example.com "))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn diagnose_reports_mechanism_drift() {
        let mut repo = MockAdminDirectoryRepository::new();
        repo.expect_find_by_uid()
            .returning(|_| Box::pin(async { Ok(None) }));
        repo.expect_find_by_email()
            .returning(|_| Box::pin(async { Ok(None) }));

        let service = AuthorizationService::new(
            Arc::new(repo),
            vec!["owner@example.com".to_string()],
        );

        let diagnostic = service
            .diagnose(&principal("uid-1", Some("owner@example.com"), false))
            .await
            .unwrap();

        assert!(diagnostic.is_admin());
        assert!(!diagnostic.in_sync());
        assert!(diagnostic.allowlisted);
        assert!(!diagnostic.directory_active);
        assert!(!diagnostic.claim);
    }
}
