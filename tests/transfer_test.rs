//! Import and export through the transfer service.

mod common;

use church_admin::domain::{Principal, RoleCode};
use church_admin::errors::AppError;
use church_admin::services::{ServiceContainer, TransferModel};
use church_admin::utils::{Dataset, Format};

use common::seeded_app;

fn user_rows(domain: &str, count: usize) -> String {
    let mut csv = String::from("email,first_name,last_name,role,phone_number\n");
    for i in 0..count {
        csv.push_str(&format!(
            "member{}@{}.jcsgo.com,Member,Number {},CM,0917000000{}\n",
            i, domain, i, i
        ));
    }
    csv
}

#[tokio::test]
async fn test_import_collects_row_errors_and_keeps_going() {
    let app = seeded_app().await;
    let admin = app.admin("tabak").await;

    let mut csv = user_rows("tabak", 9);
    // Malformed: not a church address
    csv.push_str("broken-address,Bad,Row,CM,\n");

    let report = app.import_csv(admin, TransferModel::User, &csv).await;
    assert_eq!(report.total_rows, 10);
    assert_eq!(report.created, 9);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].line, 11);
    assert!(report.skipped.is_empty());

    let imported = app.user("member3@tabak.jcsgo.com").await;
    assert_eq!(imported.role, RoleCode::Cm);
    assert_eq!(imported.church_id, app.church("tabak").await.id);
}

#[tokio::test]
async fn test_undecodable_row_is_reported_without_aborting() {
    let app = seeded_app().await;
    let admin = app.admin("tabak").await;

    let mut bytes = user_rows("tabak", 9).into_bytes();
    bytes.extend_from_slice(b"latin1@tabak.jcsgo.com,Jos\xe9,Cruz,CM,\n");

    let report = app
        .services
        .transfer()
        .import(admin, TransferModel::User, Format::Csv, bytes, false)
        .await
        .unwrap();
    assert_eq!(report.total_rows, 10);
    assert_eq!(report.created, 9);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].line, 11);
    assert!(report.errors[0].message.contains("UTF-8"));
}

#[tokio::test]
async fn test_row_errors_point_at_source_lines() {
    let app = seeded_app().await;
    let admin = app.admin("tabak").await;

    let csv = "email,first_name,last_name,role,notes\n\
               ria@tabak.jcsgo.com,Ria,Santos,CM,\"met at\nyouth camp\"\n\
               \n\
               not-an-address,Bad,Row,CM,\n";

    let report = app.import_csv(admin, TransferModel::User, csv).await;
    assert_eq!(report.created, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].line, 5);
}

#[tokio::test]
async fn test_reimport_skips_existing_users() {
    let app = seeded_app().await;
    let admin = app.admin("tabak").await;
    let csv = user_rows("tabak", 3);

    let first = app.import_csv(admin, TransferModel::User, &csv).await;
    assert_eq!(first.created, 3);

    let second = app.import_csv(admin, TransferModel::User, &csv).await;
    assert_eq!(second.created, 0);
    assert_eq!(second.skipped.len(), 3);
    assert_eq!(second.skipped[0].key, "member0@tabak.jcsgo.com");
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let app = seeded_app().await;
    let admin = app.admin("tabak").await;

    let report = app
        .services
        .transfer()
        .import(
            admin,
            TransferModel::User,
            Format::Csv,
            user_rows("tabak", 2).into_bytes(),
            true,
        )
        .await
        .unwrap();
    assert!(report.dry_run);
    assert_eq!(report.created, 2);

    let export = app
        .services
        .transfer()
        .export(admin, TransferModel::User, Format::Csv, None)
        .await
        .unwrap();
    // Only the seeded admin account
    assert_eq!(export.rows, 1);
}

#[tokio::test]
async fn test_admin_cannot_import_into_another_church() {
    let app = seeded_app().await;
    let admin = app.admin("tabak").await;

    let report = app
        .import_csv(admin, TransferModel::User, &user_rows("sanjose", 2))
        .await;
    assert_eq!(report.created, 0);
    assert_eq!(report.errors.len(), 2);
}

#[tokio::test]
async fn test_church_filtered_export_stays_in_church() {
    let app = seeded_app().await;
    app.import_csv(app.admin("tabak").await, TransferModel::User, &user_rows("tabak", 4))
        .await;
    app.import_csv(app.admin("sanjose").await, TransferModel::User, &user_rows("sanjose", 3))
        .await;

    let export = app
        .services
        .transfer()
        .export(
            app.super_admin().await,
            TransferModel::User,
            Format::Json,
            Some("sanjose".to_string()),
        )
        .await
        .unwrap();
    assert!(export.filename.starts_with("user_sanjose_"));
    assert!(export.filename.ends_with(".json"));

    let dataset = Dataset::decode(&export.bytes, Format::Json).unwrap();
    let records = dataset.records(Format::Json);
    // Three imported members plus admin@sanjose
    assert_eq!(records.len(), 4);
    for record in records {
        assert!(record.required("email").unwrap().ends_with("@sanjose.jcsgo.com"));
    }
}

#[tokio::test]
async fn test_admin_export_of_other_church_is_denied() {
    let app = seeded_app().await;

    let err = app
        .services
        .transfer()
        .export(
            app.admin("tabak").await,
            TransferModel::User,
            Format::Csv,
            Some("sanjose".to_string()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_export_filter_accepts_any_domain_casing() {
    let app = seeded_app().await;

    let export = app
        .services
        .transfer()
        .export(
            app.super_admin().await,
            TransferModel::User,
            Format::Csv,
            Some(" SanJose ".to_string()),
        )
        .await
        .unwrap();
    assert!(export.filename.starts_with("user_sanjose_"));
    assert_eq!(export.rows, 1);
}

#[tokio::test]
async fn test_group_leader_email_is_case_insensitive() {
    let app = seeded_app().await;
    app.add_members("tabak", &[("leo", "CL")]).await;
    let admin = app.admin("tabak").await;

    let report = app
        .import_csv(
            admin,
            TransferModel::Group,
            "name,church,leader_email\nGamma,tabak,Leo@Tabak.JCSGO.com\n",
        )
        .await;
    assert_eq!(report.created, 1);
    assert!(report.errors.is_empty());

    let export = app
        .services
        .transfer()
        .export(admin, TransferModel::Group, Format::Json, None)
        .await
        .unwrap();
    let dataset = Dataset::decode(&export.bytes, Format::Json).unwrap();
    let records = dataset.records(Format::Json);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("leader_email"), Some("leo@tabak.jcsgo.com"));
}

#[tokio::test]
async fn test_xlsx_export_round_trips_through_import() {
    let app = seeded_app().await;
    let system = Principal::system();
    app.import_csv(
        system,
        TransferModel::Group,
        "name,church,group_type,capacity\nAlpha,tabak,CARE,8\nBeta,tabak,MINISTRY,15\n",
    )
    .await;

    let export = app
        .services
        .transfer()
        .export(system, TransferModel::Group, Format::Xlsx, Some("tabak".to_string()))
        .await
        .unwrap();
    assert_eq!(export.rows, 2);

    // Same file again: every group already exists
    let report = app
        .services
        .transfer()
        .import(system, TransferModel::Group, Format::Xlsx, export.bytes, false)
        .await
        .unwrap();
    assert_eq!(report.total_rows, 2);
    assert_eq!(report.skipped.len(), 2);
}

#[tokio::test]
async fn test_missing_column_rejects_whole_file() {
    let app = seeded_app().await;

    let err = app
        .services
        .transfer()
        .import(
            app.admin("tabak").await,
            TransferModel::User,
            Format::Csv,
            b"email,first_name\na@tabak.jcsgo.com,A\n".to_vec(),
            false,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_export_only_models_cannot_be_imported() {
    let app = seeded_app().await;

    let err = app
        .services
        .transfer()
        .import(
            Principal::system(),
            TransferModel::ActivityLog,
            Format::Csv,
            b"id\n".to_vec(),
            false,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}
