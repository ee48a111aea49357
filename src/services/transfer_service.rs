//! Import and export of church data as CSV, XLSX or JSON.
//!
//! Exports contain only rows the principal may see. Imports validate each
//! row on its own: failing rows are reported with their file line, rows
//! whose unique key already exists are skipped, and every accepted row is
//! written in its own transaction.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{DEFAULT_GROUP_CAPACITY, MAX_IMPORT_BYTES};
use crate::domain::{
    authorize, authorize_role_assignment, normalize_domain, validate_capacity, ActivityAction,
    ActivityFilter, Church, ChurchEmail, GroupFilter, GroupType, NewActivity, NewChurch, NewFriend,
    NewGroup, NewUser, Operation, Password, Principal, RegularMember, RoleCode, User, UserFilter,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::utils::{Dataset, Format, Record};

/// Data sets that can be transferred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransferModel {
    Church,
    Role,
    User,
    NewFriend,
    RegularMember,
    Group,
    ActivityLog,
}

impl TransferModel {
    /// Every model, in dependency order
    pub const ALL: [TransferModel; 7] = [
        TransferModel::Church,
        TransferModel::Role,
        TransferModel::User,
        TransferModel::NewFriend,
        TransferModel::RegularMember,
        TransferModel::Group,
        TransferModel::ActivityLog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferModel::Church => "church",
            TransferModel::Role => "role",
            TransferModel::User => "user",
            TransferModel::NewFriend => "newfriend",
            TransferModel::RegularMember => "regularmember",
            TransferModel::Group => "group",
            TransferModel::ActivityLog => "activitylog",
        }
    }

    /// Roles, profiles and the activity log are derived data and export-only.
    pub fn is_importable(&self) -> bool {
        matches!(
            self,
            TransferModel::Church | TransferModel::User | TransferModel::Group
        )
    }

    fn required_columns(&self) -> &'static [&'static str] {
        match self {
            TransferModel::Church => &["name", "domain"],
            TransferModel::User => &["email", "first_name", "last_name"],
            TransferModel::Group => &["name"],
            _ => &[],
        }
    }
}

impl std::str::FromStr for TransferModel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-'], "");
        TransferModel::ALL
            .into_iter()
            .find(|model| model.as_str() == normalized)
            .ok_or_else(|| AppError::validation(format!("Unknown data set: {}", s.trim())))
    }
}

impl std::fmt::Display for TransferModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An encoded export ready to be written or downloaded
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub format: Format,
    pub rows: usize,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SkippedRow {
    pub line: usize,
    /// Unique key that already exists
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ImportReport {
    pub model: TransferModel,
    pub total_rows: usize,
    /// Rows written, or that would be written on a dry run
    pub created: usize,
    pub skipped: Vec<SkippedRow>,
    pub errors: Vec<RowError>,
    pub dry_run: bool,
}

enum RowOutcome {
    Created,
    Skipped(String),
}

#[async_trait]
pub trait TransferService: Send + Sync {
    /// Export a data set, optionally limited to the church with `church_domain`
    async fn export(
        &self,
        principal: Principal,
        model: TransferModel,
        format: Format,
        church_domain: Option<String>,
    ) -> AppResult<ExportFile>;

    /// Import a file; nothing is written when `dry_run` is set
    async fn import(
        &self,
        principal: Principal,
        model: TransferModel,
        format: Format,
        bytes: Vec<u8>,
        dry_run: bool,
    ) -> AppResult<ImportReport>;
}

fn time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn opt_time(at: Option<DateTime<Utc>>) -> String {
    at.as_ref().map(time).unwrap_or_default()
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// `{model}_{domain|all}_{YYYYMMDD}.{ext}`
pub fn export_filename(model: TransferModel, church_domain: Option<&str>, format: Format, on: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}.{}",
        model,
        church_domain.unwrap_or("all"),
        on.format("%Y%m%d"),
        format.extension()
    )
}

pub struct Transfer<U: UnitOfWork> {
    uow: Arc<U>,
    email_domain: String,
}

impl<U: UnitOfWork> Transfer<U> {
    pub fn new(uow: Arc<U>, email_domain: impl Into<String>) -> Self {
        Self {
            uow,
            email_domain: email_domain.into(),
        }
    }

    async fn church_domains(&self) -> AppResult<HashMap<Uuid, String>> {
        Ok(self
            .uow
            .churches()
            .list(false)
            .await?
            .into_iter()
            .map(|c| (c.id, c.domain))
            .collect())
    }

    async fn users_in(&self, scope: Option<Uuid>, roles: &[RoleCode]) -> AppResult<Vec<User>> {
        self.uow
            .users()
            .list_all(
                UserFilter {
                    church_id: scope,
                    ..UserFilter::default()
                }
                .with_roles(roles),
            )
            .await
    }

    async fn export_dataset(&self, model: TransferModel, scope: Option<Uuid>) -> AppResult<Dataset> {
        let domains = self.church_domains().await?;
        let domain_of = |id: &Uuid| domains.get(id).cloned().unwrap_or_default();

        let dataset = match model {
            TransferModel::Church => {
                let mut dataset = Dataset::new(&[
                    "name",
                    "domain",
                    "location",
                    "region",
                    "is_active",
                    "allow_public_registration",
                    "created_at",
                ]);
                for church in self.uow.churches().list(false).await? {
                    if scope.is_some_and(|id| id != church.id) {
                        continue;
                    }
                    dataset.push(vec![
                        church.name,
                        church.domain,
                        church.location,
                        church.region,
                        church.is_active.to_string(),
                        church.allow_public_registration.to_string(),
                        time(&church.created_at),
                    ]);
                }
                dataset
            }
            TransferModel::Role => {
                let mut dataset = Dataset::new(&["code", "permission_level", "description"]);
                for role in self.uow.roles().list().await? {
                    dataset.push(vec![
                        role.code.to_string(),
                        role.permission_level.to_string(),
                        role.description,
                    ]);
                }
                dataset
            }
            TransferModel::User => {
                let mut dataset = Dataset::new(&[
                    "email",
                    "first_name",
                    "last_name",
                    "church",
                    "role",
                    "phone_number",
                    "is_active",
                    "last_attendance",
                    "transition_date",
                    "created_at",
                ]);
                for user in self.users_in(scope, &[]).await? {
                    dataset.push(vec![
                        user.email.clone(),
                        user.first_name.clone(),
                        user.last_name.clone(),
                        domain_of(&user.church_id),
                        user.role.to_string(),
                        text(&user.phone_number),
                        user.is_active.to_string(),
                        opt_time(user.last_attendance),
                        opt_time(user.transition_date),
                        time(&user.created_at),
                    ]);
                }
                dataset
            }
            TransferModel::NewFriend => {
                let mut dataset = Dataset::new(&[
                    "email",
                    "church",
                    "timer_status",
                    "follow_up_status",
                    "follow_up_notes",
                    "last_follow_up",
                    "source",
                    "notes",
                    "registered_at",
                ]);
                let users = self.users_in(scope, &[RoleCode::NewFriend]).await?;
                let ids = users.iter().map(|u| u.id).collect();
                let profiles: HashMap<Uuid, NewFriend> = self
                    .uow
                    .members()
                    .new_friends_for(ids)
                    .await?
                    .into_iter()
                    .map(|p| (p.user_id, p))
                    .collect();
                for user in users {
                    let Some(profile) = profiles.get(&user.id) else {
                        continue;
                    };
                    dataset.push(vec![
                        user.email.clone(),
                        domain_of(&user.church_id),
                        profile.timer_status.value().to_string(),
                        profile.follow_up_status.to_string(),
                        text(&profile.follow_up_notes),
                        opt_time(profile.last_follow_up),
                        text(&profile.source),
                        text(&profile.notes),
                        time(&profile.registered_at),
                    ]);
                }
                dataset
            }
            TransferModel::RegularMember => {
                let mut dataset = Dataset::new(&[
                    "email",
                    "church",
                    "role_type",
                    "group",
                    "ministry_involvement",
                    "skills",
                    "joined_at",
                ]);
                let users = self.users_in(scope, &RoleCode::REGULAR).await?;
                let ids = users.iter().map(|u| u.id).collect();
                let profiles: HashMap<Uuid, RegularMember> = self
                    .uow
                    .members()
                    .regulars_for(ids)
                    .await?
                    .into_iter()
                    .map(|p| (p.user_id, p))
                    .collect();
                let group_names: HashMap<Uuid, String> = self
                    .uow
                    .groups()
                    .list_all(GroupFilter::for_church(scope))
                    .await?
                    .into_iter()
                    .map(|g| (g.id, g.name))
                    .collect();
                for user in users {
                    let Some(profile) = profiles.get(&user.id) else {
                        continue;
                    };
                    let group = profile
                        .group_id
                        .and_then(|id| group_names.get(&id).cloned())
                        .unwrap_or_default();
                    dataset.push(vec![
                        user.email.clone(),
                        domain_of(&user.church_id),
                        profile.role_type.to_string(),
                        group,
                        text(&profile.ministry_involvement),
                        text(&profile.skills),
                        time(&profile.joined_at),
                    ]);
                }
                dataset
            }
            TransferModel::Group => {
                let mut dataset = Dataset::new(&[
                    "church",
                    "name",
                    "group_type",
                    "leader_email",
                    "capacity",
                    "member_count",
                    "meeting_time",
                    "description",
                    "is_active",
                    "created_at",
                ]);
                let groups = self.uow.groups().list_all(GroupFilter::for_church(scope)).await?;
                let leader_ids = groups.iter().filter_map(|g| g.leader_id).collect();
                let leaders: HashMap<Uuid, String> = self
                    .uow
                    .users()
                    .find_many(leader_ids)
                    .await?
                    .into_iter()
                    .map(|u| (u.id, u.email))
                    .collect();
                let counts: HashMap<Uuid, u64> = self
                    .uow
                    .members()
                    .count_in_groups(groups.iter().map(|g| g.id).collect())
                    .await?
                    .into_iter()
                    .collect();
                for group in groups {
                    dataset.push(vec![
                        domain_of(&group.church_id),
                        group.name.clone(),
                        group.group_type.to_string(),
                        group
                            .leader_id
                            .and_then(|id| leaders.get(&id).cloned())
                            .unwrap_or_default(),
                        group.capacity.to_string(),
                        counts.get(&group.id).copied().unwrap_or(0).to_string(),
                        text(&group.meeting_time),
                        text(&group.description),
                        group.is_active.to_string(),
                        time(&group.created_at),
                    ]);
                }
                dataset
            }
            TransferModel::ActivityLog => {
                let mut dataset = Dataset::new(&[
                    "timestamp",
                    "church",
                    "user_email",
                    "action",
                    "description",
                    "metadata",
                    "ip_address",
                    "user_agent",
                ]);
                let entries = self
                    .uow
                    .activity()
                    .list_all(ActivityFilter {
                        church_id: scope,
                        ..ActivityFilter::default()
                    })
                    .await?;
                let user_ids: Vec<Uuid> = entries
                    .iter()
                    .map(|e| e.user_id)
                    .collect::<HashSet<_>>()
                    .into_iter()
                    .collect();
                let emails: HashMap<Uuid, String> = self
                    .uow
                    .users()
                    .find_many(user_ids)
                    .await?
                    .into_iter()
                    .map(|u| (u.id, u.email))
                    .collect();
                for entry in entries {
                    dataset.push(vec![
                        time(&entry.timestamp),
                        domain_of(&entry.church_id),
                        emails.get(&entry.user_id).cloned().unwrap_or_default(),
                        entry.action.to_string(),
                        entry.description.clone(),
                        entry.metadata.as_ref().map(|m| m.to_string()).unwrap_or_default(),
                        text(&entry.ip_address),
                        text(&entry.user_agent),
                    ]);
                }
                dataset
            }
        };

        Ok(dataset)
    }

    async fn import_church(&self, record: &Record, dry_run: bool, seen: &mut HashSet<String>) -> AppResult<RowOutcome> {
        let church = NewChurch {
            name: record.required("name")?.to_string(),
            domain: record.required("domain")?.to_string(),
            location: record.get("location").unwrap_or_default().to_string(),
            region: record.get("region").unwrap_or_default().to_string(),
        }
        .normalized()?;

        let key = church.domain.clone();
        if !seen.insert(key.clone()) || self.uow.churches().find_by_domain(&key).await?.is_some() {
            return Ok(RowOutcome::Skipped(key));
        }
        if dry_run {
            return Ok(RowOutcome::Created);
        }

        self.uow
            .transaction(move |ctx| Box::pin(async move { ctx.churches().create(church).await }))
            .await?;
        Ok(RowOutcome::Created)
    }

    async fn resolve_church(&self, principal: &Principal, domain: Option<&str>) -> AppResult<Church> {
        let church = match domain {
            Some(domain) => {
                let domain = normalize_domain(domain)?;
                self.uow
                    .churches()
                    .find_by_domain(&domain)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Church '{}'", domain)))?
            }
            None => self
                .uow
                .churches()
                .find_by_id(principal.church_id)
                .await?
                .ok_or_not_found("Church")?,
        };
        authorize(principal, church.id, Operation::ImportData)?;
        Ok(church)
    }

    async fn import_user(
        &self,
        principal: &Principal,
        record: &Record,
        dry_run: bool,
        seen: &mut HashSet<String>,
    ) -> AppResult<RowOutcome> {
        let email = record.required("email")?.to_ascii_lowercase();
        let parsed = ChurchEmail::parse(&email, &self.email_domain)?;
        if let Some(domain) = record.get("church") {
            if normalize_domain(domain)? != parsed.church_domain {
                return Err(AppError::validation(format!(
                    "Email {} does not belong to church '{}'",
                    email, domain
                )));
            }
        }
        let church = self
            .resolve_church(principal, Some(&parsed.church_domain))
            .await?;

        let role = record
            .get("role")
            .map(|r| r.parse::<RoleCode>())
            .transpose()?
            .unwrap_or(RoleCode::NewFriend);
        authorize_role_assignment(principal, church.id, role)?;

        let first_name = record.required("first_name")?.to_string();
        let last_name = record.required("last_name")?.to_string();

        if !seen.insert(email.clone()) || self.uow.users().find_by_email(&email).await?.is_some() {
            return Ok(RowOutcome::Skipped(email));
        }

        let password = match record.get("password") {
            Some(plain) => Password::new(plain)?,
            None => Password::unusable(),
        };
        if dry_run {
            return Ok(RowOutcome::Created);
        }

        let new_user = NewUser {
            email,
            password_hash: password.into_string(),
            first_name,
            last_name,
            church_id: church.id,
            role,
            phone_number: record.get("phone_number").map(str::to_string),
        };
        let source = record.get("source").map(str::to_string);
        let actor = principal.user_id;

        self.uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let user = ctx.users().create(new_user).await?;
                    if role.is_new_friend() {
                        ctx.members()
                            .create_new_friend(NewFriend::fresh(user.id, source))
                            .await?;
                    } else if role.is_regular() {
                        ctx.members()
                            .create_regular(RegularMember::fresh(user.id, role))
                            .await?;
                    }
                    ctx.activity()
                        .append(
                            NewActivity::new(
                                user.id,
                                user.church_id,
                                ActivityAction::Register,
                                format!("{} imported as {}", user.full_name(), role),
                            )
                            .with_metadata(serde_json::json!({
                                "source": "import",
                                "performed_by": actor,
                            })),
                        )
                        .await?;
                    Ok(())
                })
            })
            .await?;
        Ok(RowOutcome::Created)
    }

    async fn import_group(
        &self,
        principal: &Principal,
        record: &Record,
        dry_run: bool,
        seen: &mut HashSet<String>,
    ) -> AppResult<RowOutcome> {
        let church = self.resolve_church(principal, record.get("church")).await?;
        let name = record.required("name")?.to_string();

        let group_type = record
            .get("group_type")
            .map(|t| t.parse::<GroupType>())
            .transpose()?
            .unwrap_or(GroupType::Care);
        let capacity = record
            .get("capacity")
            .map(|c| {
                c.parse::<i32>()
                    .map_err(|_| AppError::validation(format!("Capacity '{}' is not a whole number", c)))
            })
            .transpose()?
            .unwrap_or(DEFAULT_GROUP_CAPACITY);
        validate_capacity(capacity)?;

        let leader_id = match record.get("leader_email") {
            Some(email) => {
                let email = email.to_lowercase();
                let leader = self
                    .uow
                    .users()
                    .find_by_email(&email)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Leader '{}'", email)))?;
                if leader.church_id != church.id {
                    return Err(AppError::TenantMismatch);
                }
                Some(leader.id)
            }
            None => None,
        };

        let key = format!("{}/{}", church.domain, name.to_lowercase());
        if !seen.insert(key.clone()) || self.uow.groups().find_by_name(church.id, &name).await?.is_some() {
            return Ok(RowOutcome::Skipped(key));
        }
        if dry_run {
            return Ok(RowOutcome::Created);
        }

        let group = NewGroup {
            church_id: church.id,
            name,
            group_type,
            leader_id,
            capacity,
            meeting_time: record.get("meeting_time").map(str::to_string),
            description: record.get("description").map(str::to_string),
        };
        self.uow
            .transaction(move |ctx| Box::pin(async move { ctx.groups().create(group).await }))
            .await?;
        Ok(RowOutcome::Created)
    }
}

#[async_trait]
impl<U: UnitOfWork> TransferService for Transfer<U> {
    async fn export(
        &self,
        principal: Principal,
        model: TransferModel,
        format: Format,
        church_domain: Option<String>,
    ) -> AppResult<ExportFile> {
        let requested = match church_domain.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(domain) => Some(
                self.uow
                    .churches()
                    .find_by_domain(&normalize_domain(domain)?)
                    .await?
                    .ok_or_not_found("Church")?,
            ),
            None => None,
        };
        let scope = principal.scope(requested.as_ref().map(|c| c.id), Operation::ExportData)?;

        let label = match (&requested, scope) {
            (Some(church), _) => Some(church.domain.clone()),
            (None, Some(id)) => self.uow.churches().find_by_id(id).await?.map(|c| c.domain),
            (None, None) => None,
        };

        let dataset = self.export_dataset(model, scope).await?;
        let bytes = dataset.encode(format)?;
        let filename = export_filename(model, label.as_deref(), format, Utc::now());

        tracing::info!(
            user_id = %principal.user_id,
            model = %model,
            rows = dataset.len(),
            %filename,
            "Data exported"
        );

        Ok(ExportFile {
            filename,
            format,
            rows: dataset.len(),
            bytes,
        })
    }

    async fn import(
        &self,
        principal: Principal,
        model: TransferModel,
        format: Format,
        bytes: Vec<u8>,
        dry_run: bool,
    ) -> AppResult<ImportReport> {
        if principal.is_super_admin() {
            tracing::debug!(model = %model, "Import by super admin");
        } else {
            authorize(&principal, principal.church_id, Operation::ImportData)?;
        }
        if !model.is_importable() {
            return Err(AppError::validation(format!("{} can only be exported", model)));
        }
        if model == TransferModel::Church {
            authorize(&principal, principal.church_id, Operation::ManageChurches)?;
        }
        if bytes.len() > MAX_IMPORT_BYTES {
            return Err(AppError::validation(format!(
                "Import files are limited to {} MiB",
                MAX_IMPORT_BYTES / (1024 * 1024)
            )));
        }

        let dataset = Dataset::decode(&bytes, format)?;
        for column in model.required_columns() {
            if !dataset.has_column(column) {
                return Err(AppError::validation(format!("Missing column '{}'", column)));
            }
        }

        let mut report = ImportReport {
            model,
            total_rows: 0,
            created: 0,
            skipped: Vec::new(),
            errors: Vec::new(),
            dry_run,
        };
        let mut seen = HashSet::new();

        for record in dataset.records(format) {
            if let Some(message) = &record.error {
                report.total_rows += 1;
                report.errors.push(RowError {
                    line: record.line,
                    message: message.clone(),
                });
                continue;
            }
            if record.is_blank() {
                continue;
            }
            report.total_rows += 1;

            let outcome = match model {
                TransferModel::Church => self.import_church(&record, dry_run, &mut seen).await,
                TransferModel::User => self.import_user(&principal, &record, dry_run, &mut seen).await,
                TransferModel::Group => self.import_group(&principal, &record, dry_run, &mut seen).await,
                other => Err(AppError::validation(format!("{} can only be exported", other))),
            };

            match outcome {
                Ok(RowOutcome::Created) => report.created += 1,
                Ok(RowOutcome::Skipped(key)) => report.skipped.push(SkippedRow {
                    line: record.line,
                    key,
                }),
                Err(e) if e.is_row_recoverable() => {
                    tracing::debug!(line = record.line, error = %e, "Import row rejected");
                    report.errors.push(RowError {
                        line: record.line,
                        message: e.user_message(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            model = %model,
            total = report.total_rows,
            created = report.created,
            skipped = report.skipped.len(),
            errors = report.errors.len(),
            dry_run,
            "Import finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_model_parse_accepts_separators() {
        assert_eq!("new_friend".parse::<TransferModel>().unwrap(), TransferModel::NewFriend);
        assert_eq!("ActivityLog".parse::<TransferModel>().unwrap(), TransferModel::ActivityLog);
        assert!("sermon".parse::<TransferModel>().is_err());
    }

    #[test]
    fn test_only_primary_records_are_importable() {
        let importable: Vec<TransferModel> = TransferModel::ALL
            .into_iter()
            .filter(|m| m.is_importable())
            .collect();
        assert_eq!(
            importable,
            vec![TransferModel::Church, TransferModel::User, TransferModel::Group]
        );
    }

    #[test]
    fn test_export_filename() {
        let on = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        assert_eq!(
            export_filename(TransferModel::User, Some("kasiglahan"), Format::Csv, on),
            "user_kasiglahan_20261016.csv"
        );
        assert_eq!(
            export_filename(TransferModel::ActivityLog, None, Format::Xlsx, on),
            "activitylog_all_20261016.xlsx"
        );
    }
}
