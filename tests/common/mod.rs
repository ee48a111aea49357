//! Shared fixtures for the integration tests: an in-memory SQLite database
//! with migrations applied and the canonical churches seeded.

#![allow(dead_code)]

use std::sync::Arc;

use sea_orm::{ConnectOptions, Database as SeaDatabase, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use church_admin::config::Config;
use church_admin::domain::{Church, ClientMeta, Principal, User};
use church_admin::infra::{Migrator, Persistence, UnitOfWork};
use church_admin::services::{
    ImportReport, ServiceContainer, Services, SetupOptions, TransferModel,
};
use church_admin::utils::Format;

pub const TEST_SECRET: &str = "test-secret-key-for-testing-only-32chars";
pub const SUPER_ADMIN_PASSWORD: &str = "super-secret-pass";

/// A seeded database with services wired on top of it
pub struct TestApp {
    pub db: DatabaseConnection,
    pub uow: Arc<Persistence>,
    pub services: Services,
}

pub fn test_config() -> Config {
    Config::new("sqlite::memory:", TEST_SECRET).expect("valid test config")
}

/// Fresh in-memory database. A single pooled connection keeps every query
/// on the same memory database.
pub async fn test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = SeaDatabase::connect(options)
        .await
        .expect("in-memory database");
    Migrator::up(&db, None).await.expect("migrations apply");
    db
}

/// Database with roles, churches and the super admin seeded. Church admin
/// accounts are created locked.
pub async fn seeded_app() -> TestApp {
    let db = test_db().await;
    let services = Services::from_connection(db.clone(), test_config());
    services
        .setup()
        .run(SetupOptions {
            admin_password: None,
            super_admin_password: Some(SUPER_ADMIN_PASSWORD.to_string()),
        })
        .await
        .expect("setup succeeds");

    TestApp {
        uow: Arc::new(Persistence::new(db.clone())),
        db,
        services,
    }
}

impl TestApp {
    pub async fn church(&self, domain: &str) -> Church {
        self.uow
            .churches()
            .find_by_domain(domain)
            .await
            .expect("query")
            .expect("church exists")
    }

    pub async fn user(&self, email: &str) -> User {
        self.uow
            .users()
            .find_by_email(email)
            .await
            .expect("query")
            .expect("user exists")
    }

    /// The seeded `admin@{domain}` account
    pub async fn admin(&self, domain: &str) -> Principal {
        self.user(&format!("admin@{}.jcsgo.com", domain))
            .await
            .principal()
    }

    pub async fn super_admin(&self) -> Principal {
        self.user("superadmin@kasiglahan.jcsgo.com")
            .await
            .principal()
    }

    /// Import CSV text as `principal`
    pub async fn import_csv(&self, principal: Principal, model: TransferModel, csv: &str) -> ImportReport {
        self.services
            .transfer()
            .import(principal, model, Format::Csv, csv.as_bytes().to_vec(), false)
            .await
            .expect("import runs")
    }

    /// Add members to a church through a user import (no passwords)
    pub async fn add_members(&self, domain: &str, members: &[(&str, &str)]) -> Vec<User> {
        let mut csv = String::from("email,first_name,last_name,role\n");
        for (prefix, role) in members {
            csv.push_str(&format!("{}@{}.jcsgo.com,{},Test,{}\n", prefix, domain, prefix, role));
        }
        let report = self
            .import_csv(self.admin(domain).await, TransferModel::User, &csv)
            .await;
        assert!(report.errors.is_empty(), "fixture import failed: {:?}", report.errors);

        let mut users = Vec::new();
        for (prefix, _) in members {
            users.push(self.user(&format!("{}@{}.jcsgo.com", prefix, domain)).await);
        }
        users
    }
}

pub fn client() -> ClientMeta {
    ClientMeta {
        ip_address: Some("127.0.0.1".to_string()),
        user_agent: Some("integration-test".to_string()),
    }
}
