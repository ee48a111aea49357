//! Church directory: selection, detection from email and administration.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{authorize, Church, ChurchEmail, NewChurch, Operation, Principal};
use crate::errors::{AppResult, OptionExt};
use crate::infra::UnitOfWork;

/// Active churches of one region, for the church selection screen
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegionChurches {
    #[schema(example = "Region 4A")]
    pub region: String,
    pub churches: Vec<Church>,
}

#[async_trait]
pub trait ChurchService: Send + Sync {
    /// Active churches grouped by region, regions and names in order
    async fn directory(&self) -> AppResult<Vec<RegionChurches>>;

    /// Active church by domain
    async fn find_by_domain(&self, domain: &str) -> AppResult<Church>;

    /// Resolve the church an email address belongs to
    async fn detect_from_email(&self, email: &str) -> AppResult<Church>;

    async fn create(&self, principal: Principal, church: NewChurch) -> AppResult<Church>;

    async fn set_active(&self, principal: Principal, id: Uuid, is_active: bool) -> AppResult<Church>;
}

/// Group a region-ordered church list into directory sections.
pub fn group_by_region(churches: Vec<Church>) -> Vec<RegionChurches> {
    let mut sections: Vec<RegionChurches> = Vec::new();
    for church in churches {
        match sections.last_mut() {
            Some(section) if section.region == church.region => section.churches.push(church),
            _ => sections.push(RegionChurches {
                region: church.region.clone(),
                churches: vec![church],
            }),
        }
    }
    sections
}

pub struct ChurchManager<U: UnitOfWork> {
    uow: Arc<U>,
    email_domain: String,
}

impl<U: UnitOfWork> ChurchManager<U> {
    pub fn new(uow: Arc<U>, email_domain: impl Into<String>) -> Self {
        Self {
            uow,
            email_domain: email_domain.into(),
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> ChurchService for ChurchManager<U> {
    async fn directory(&self) -> AppResult<Vec<RegionChurches>> {
        let churches = self.uow.churches().list(true).await?;
        Ok(group_by_region(churches))
    }

    async fn find_by_domain(&self, domain: &str) -> AppResult<Church> {
        self.uow
            .churches()
            .find_by_domain(domain)
            .await?
            .filter(|church| church.is_active)
            .ok_or_not_found("Church")
    }

    async fn detect_from_email(&self, email: &str) -> AppResult<Church> {
        let parsed = ChurchEmail::parse(email, &self.email_domain)?;
        self.find_by_domain(&parsed.church_domain).await
    }

    async fn create(&self, principal: Principal, church: NewChurch) -> AppResult<Church> {
        authorize(&principal, principal.church_id, Operation::ManageChurches)?;

        let church = self.uow.churches().create(church.normalized()?).await?;
        tracing::info!(church = %church.domain, "Church created");
        Ok(church)
    }

    async fn set_active(&self, principal: Principal, id: Uuid, is_active: bool) -> AppResult<Church> {
        authorize(&principal, id, Operation::ManageChurches)?;

        let church = self.uow.churches().set_active(id, is_active).await?;
        tracing::info!(church = %church.domain, is_active, "Church activation changed");
        Ok(church)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn church(domain: &str, region: &str) -> Church {
        Church {
            id: Uuid::new_v4(),
            name: format!("JCSGO {}", domain),
            domain: domain.to_string(),
            location: String::new(),
            region: region.to_string(),
            is_active: true,
            allow_public_registration: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_by_region_keeps_order() {
        let sections = group_by_region(vec![
            church("10amfamily", "Central Region"),
            church("3pmfamily", "Central Region"),
            church("kasiglahan", "Region 4A"),
        ]);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].region, "Central Region");
        assert_eq!(sections[0].churches.len(), 2);
        assert_eq!(sections[1].churches[0].domain, "kasiglahan");
    }

    #[test]
    fn test_group_by_region_empty() {
        assert!(group_by_region(Vec::new()).is_empty());
    }
}
