//! Initial data setup: roles, the canonical church branches and their
//! administrator accounts. Every step checks for existing rows first, so
//! running it again only fills in what is missing.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::config::{CHURCH_ADMIN_PREFIX, SUPER_ADMIN_PREFIX};
use crate::domain::{
    compose_email, ActivityAction, Church, NewActivity, NewChurch, NewUser, Password, RoleCode,
};
use crate::errors::{AppResult, OptionExt};
use crate::infra::UnitOfWork;

/// A church branch created by setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalChurch {
    pub domain: &'static str,
    pub name: &'static str,
    pub location: &'static str,
    pub region: &'static str,
}

const REGION_4A: &str = "Region 4A";
const CENTRAL_REGION: &str = "Central Region";

pub const CANONICAL_CHURCHES: [CanonicalChurch; 6] = [
    CanonicalChurch {
        domain: "kasiglahan",
        name: "JCSGO Kasiglahan",
        location: "Kasiglahan, Rodriguez (Montalban), Rizal",
        region: REGION_4A,
    },
    CanonicalChurch {
        domain: "sanjose",
        name: "JCSGO San Jose",
        location: "San Jose, Rodriguez (Montalban), Rizal",
        region: REGION_4A,
    },
    CanonicalChurch {
        domain: "christinville",
        name: "JCSGO Christin Ville",
        location: "Christin Ville, Rodriguez (Montalban), Rizal",
        region: REGION_4A,
    },
    CanonicalChurch {
        domain: "tabak",
        name: "JCSGO Tabak",
        location: "Tabak, Rodriguez (Montalban), Rizal",
        region: REGION_4A,
    },
    CanonicalChurch {
        domain: "10amfamily",
        name: "JCSGO 10am Family",
        location: "Cubao, Quezon City, Metro Manila",
        region: CENTRAL_REGION,
    },
    CanonicalChurch {
        domain: "3pmfamily",
        name: "JCSGO 3pm Family",
        location: "Cubao, Quezon City, Metro Manila",
        region: CENTRAL_REGION,
    },
];

/// Home church of the seeded super administrator
pub const SUPER_ADMIN_CHURCH: &str = "kasiglahan";

/// Initial passwords for the seeded accounts. Accounts created without one
/// get an unusable password and cannot log in until it is reset.
#[derive(Debug, Clone, Default)]
pub struct SetupOptions {
    pub admin_password: Option<String>,
    pub super_admin_password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SetupReport {
    pub roles_created: usize,
    pub churches_created: usize,
    pub accounts_created: Vec<String>,
}

#[async_trait]
pub trait SetupService: Send + Sync {
    /// Seed roles, churches and administrator accounts
    async fn run(&self, options: SetupOptions) -> AppResult<SetupReport>;

    /// Re-apply the canonical location and region of each known church.
    /// Returns the number of churches updated.
    async fn update_locations(&self) -> AppResult<usize>;
}

pub struct Setup<U: UnitOfWork> {
    uow: Arc<U>,
    email_domain: String,
}

impl<U: UnitOfWork> Setup<U> {
    pub fn new(uow: Arc<U>, email_domain: impl Into<String>) -> Self {
        Self {
            uow,
            email_domain: email_domain.into(),
        }
    }

    async fn ensure_church(&self, canonical: &CanonicalChurch) -> AppResult<(Church, bool)> {
        if let Some(church) = self.uow.churches().find_by_domain(canonical.domain).await? {
            return Ok((church, false));
        }

        let church = self
            .uow
            .churches()
            .create(NewChurch {
                name: canonical.name.to_string(),
                domain: canonical.domain.to_string(),
                location: canonical.location.to_string(),
                region: canonical.region.to_string(),
            })
            .await?;
        tracing::info!(domain = %church.domain, "Created church");
        Ok((church, true))
    }

    /// Create the account unless the address is taken. Returns the email when created.
    async fn ensure_account(
        &self,
        church: &Church,
        prefix: &str,
        role: RoleCode,
        password: Option<&str>,
    ) -> AppResult<Option<String>> {
        let email = compose_email(prefix, &church.domain, &self.email_domain)?;
        if self.uow.users().find_by_email(&email).await?.is_some() {
            return Ok(None);
        }

        let password = match password {
            Some(plain) => Password::new(plain)?,
            None => {
                tracing::warn!(%email, "No initial password configured; account created locked");
                Password::unusable()
            }
        };

        let new_user = NewUser {
            email: email.clone(),
            password_hash: password.into_string(),
            first_name: if role == RoleCode::SuperAdmin { "Super" } else { "Church" }.to_string(),
            last_name: "Admin".to_string(),
            church_id: church.id,
            role,
            phone_number: None,
        };

        self.uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let user = ctx.users().create(new_user).await?;
                    ctx.activity()
                        .append(
                            NewActivity::new(
                                user.id,
                                user.church_id,
                                ActivityAction::Register,
                                format!("{} account created by setup", role),
                            )
                            .with_metadata(serde_json::json!({ "source": "setup" })),
                        )
                        .await?;
                    Ok(())
                })
            })
            .await?;

        tracing::info!(%email, role = %role, "Created account");
        Ok(Some(email))
    }
}

#[async_trait]
impl<U: UnitOfWork> SetupService for Setup<U> {
    async fn run(&self, options: SetupOptions) -> AppResult<SetupReport> {
        let mut report = SetupReport::default();

        for code in RoleCode::ALL {
            if self.uow.roles().ensure(code).await? {
                report.roles_created += 1;
            }
        }

        let mut churches = Vec::with_capacity(CANONICAL_CHURCHES.len());
        for canonical in &CANONICAL_CHURCHES {
            let (church, created) = self.ensure_church(canonical).await?;
            if created {
                report.churches_created += 1;
            }
            churches.push(church);
        }

        for church in &churches {
            if let Some(email) = self
                .ensure_account(
                    church,
                    CHURCH_ADMIN_PREFIX,
                    RoleCode::Admin,
                    options.admin_password.as_deref(),
                )
                .await?
            {
                report.accounts_created.push(email);
            }
        }

        let home = churches
            .iter()
            .find(|c| c.domain == SUPER_ADMIN_CHURCH)
            .ok_or_not_found("Church")?;
        if let Some(email) = self
            .ensure_account(
                home,
                SUPER_ADMIN_PREFIX,
                RoleCode::SuperAdmin,
                options.super_admin_password.as_deref(),
            )
            .await?
        {
            report.accounts_created.push(email);
        }

        tracing::info!(
            roles = report.roles_created,
            churches = report.churches_created,
            accounts = report.accounts_created.len(),
            "Setup complete"
        );
        Ok(report)
    }

    async fn update_locations(&self) -> AppResult<usize> {
        let mut updated = 0;
        for canonical in &CANONICAL_CHURCHES {
            match self.uow.churches().find_by_domain(canonical.domain).await? {
                Some(church) => {
                    self.uow
                        .churches()
                        .update_location(
                            church.id,
                            canonical.location.to_string(),
                            canonical.region.to_string(),
                        )
                        .await?;
                    tracing::info!(domain = canonical.domain, location = canonical.location, "Updated church location");
                    updated += 1;
                }
                None => tracing::warn!(domain = canonical.domain, "Church not found"),
            }
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalize_domain;

    #[test]
    fn test_canonical_domains_are_valid_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for church in CANONICAL_CHURCHES {
            assert_eq!(normalize_domain(church.domain).unwrap(), church.domain);
            assert!(seen.insert(church.domain));
        }
        assert!(seen.contains(SUPER_ADMIN_CHURCH));
    }

    #[test]
    fn test_churches_split_across_two_regions() {
        let central = CANONICAL_CHURCHES
            .iter()
            .filter(|c| c.region == CENTRAL_REGION)
            .count();
        assert_eq!(central, 2);
        assert_eq!(CANONICAL_CHURCHES.len() - central, 4);
    }
}
