//! Church registry entity and church-scoped email addresses.
//!
//! Every member email has the shape `{prefix}@{church_domain}.{email_domain}`,
//! so the owning church can always be read back from the address.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{EMAIL_PREFIX_MAX_LENGTH, EMAIL_PREFIX_MIN_LENGTH};
use crate::errors::{AppError, AppResult};

/// Church subdomain: lowercase alphanumerics and inner hyphens, 3-50 chars
pub static DOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9-]{1,48}[a-z0-9]$").expect("church domain pattern compiles")
});

/// A church branch (tenant)
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Church {
    pub id: Uuid,
    pub name: String,
    /// Unique subdomain, e.g. `kasiglahan`
    pub domain: String,
    pub location: String,
    pub region: String,
    pub is_active: bool,
    pub allow_public_registration: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Church {
    /// Compose a member email for this church from a local prefix.
    pub fn compose_email(&self, prefix: &str, email_domain: &str) -> AppResult<String> {
        compose_email(prefix, &self.domain, email_domain)
    }

    /// Check that `email` belongs to this church.
    pub fn owns_email(&self, email: &str, email_domain: &str) -> bool {
        ChurchEmail::parse(email, email_domain)
            .map(|parsed| parsed.church_domain == self.domain)
            .unwrap_or(false)
    }
}

/// Data needed to register a church
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewChurch {
    #[schema(example = "JCSGO Kasiglahan")]
    pub name: String,
    #[schema(example = "kasiglahan")]
    pub domain: String,
    #[schema(example = "Rodriguez (Montalban), Rizal")]
    pub location: String,
    #[schema(example = "Region 4A")]
    pub region: String,
}

impl NewChurch {
    /// Normalize and validate the fields.
    pub fn normalized(self) -> AppResult<Self> {
        let domain = normalize_domain(&self.domain)?;
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("Church name is required"));
        }
        Ok(Self {
            name,
            domain,
            location: self.location.trim().to_string(),
            region: self.region.trim().to_string(),
        })
    }
}

/// Lowercase and validate a church domain.
pub fn normalize_domain(domain: &str) -> AppResult<String> {
    let domain = domain.trim().to_ascii_lowercase();
    if !DOMAIN_RE.is_match(&domain) {
        return Err(AppError::validation(format!(
            "Invalid church domain '{}': use 3-50 lowercase letters, digits or hyphens",
            domain
        )));
    }
    Ok(domain)
}

/// Validate the local part of a church email.
pub fn validate_prefix(prefix: &str) -> AppResult<()> {
    let len = prefix.chars().count();
    if !(EMAIL_PREFIX_MIN_LENGTH..=EMAIL_PREFIX_MAX_LENGTH).contains(&len) {
        return Err(AppError::validation(format!(
            "Email prefix must be {}-{} characters",
            EMAIL_PREFIX_MIN_LENGTH, EMAIL_PREFIX_MAX_LENGTH
        )));
    }
    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::validation(
            "Email prefix can only contain letters and numbers",
        ));
    }
    Ok(())
}

/// Compose `{prefix}@{church_domain}.{email_domain}`.
pub fn compose_email(prefix: &str, church_domain: &str, email_domain: &str) -> AppResult<String> {
    let prefix = prefix.trim().to_ascii_lowercase();
    validate_prefix(&prefix)?;
    Ok(format!("{}@{}.{}", prefix, church_domain, email_domain))
}

/// A church email split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChurchEmail {
    pub prefix: String,
    pub church_domain: String,
}

impl ChurchEmail {
    /// Parse a church email, rejecting addresses outside `email_domain`.
    pub fn parse(email: &str, email_domain: &str) -> AppResult<Self> {
        let email = email.trim().to_ascii_lowercase();
        let (prefix, host) = email
            .split_once('@')
            .ok_or_else(|| AppError::validation(format!("Invalid email address: {}", email)))?;

        let suffix = format!(".{}", email_domain);
        let church_domain = host.strip_suffix(&suffix).ok_or_else(|| {
            AppError::validation(format!(
                "Email must use a church address ending in @<church>.{}",
                email_domain
            ))
        })?;

        validate_prefix(prefix)?;
        let church_domain = normalize_domain(church_domain)?;

        Ok(Self {
            prefix: prefix.to_string(),
            church_domain,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUFFIX: &str = "jcsgo.com";

    fn church(domain: &str) -> Church {
        Church {
            id: Uuid::new_v4(),
            name: "JCSGO Test".to_string(),
            domain: domain.to_string(),
            location: String::new(),
            region: String::new(),
            is_active: true,
            allow_public_registration: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_compose_email() {
        let email = compose_email("JuanDC", "kasiglahan", SUFFIX).unwrap();
        assert_eq!(email, "juandc@kasiglahan.jcsgo.com");
    }

    #[test]
    fn test_compose_rejects_bad_prefix() {
        assert!(compose_email("ab", "kasiglahan", SUFFIX).is_err());
        assert!(compose_email("juan.dc", "kasiglahan", SUFFIX).is_err());
    }

    #[test]
    fn test_parse_email_extracts_church() {
        let parsed = ChurchEmail::parse("Maria01@10AMfamily.jcsgo.com", SUFFIX).unwrap();
        assert_eq!(parsed.prefix, "maria01");
        assert_eq!(parsed.church_domain, "10amfamily");
    }

    #[test]
    fn test_parse_rejects_foreign_domain() {
        assert!(ChurchEmail::parse("maria@gmail.com", SUFFIX).is_err());
        assert!(ChurchEmail::parse("maria@jcsgo.com", SUFFIX).is_err());
        assert!(ChurchEmail::parse("no-at-sign", SUFFIX).is_err());
    }

    #[test]
    fn test_owns_email() {
        let tabak = church("tabak");
        assert!(tabak.owns_email("pedro@tabak.jcsgo.com", SUFFIX));
        assert!(!tabak.owns_email("pedro@sanjose.jcsgo.com", SUFFIX));
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain(" SanJose ").unwrap(), "sanjose");
        assert!(normalize_domain("a").is_err());
        assert!(normalize_domain("san jose").is_err());
    }
}
