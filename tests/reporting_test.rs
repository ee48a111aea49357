//! Dashboards and statistics over seeded data.

mod common;

use church_admin::domain::{ActivityAction, RoleCode};
use church_admin::errors::AppError;
use church_admin::services::ServiceContainer;

use common::{client, seeded_app};

#[tokio::test]
async fn test_cross_church_dashboard_requires_super_admin() {
    let app = seeded_app().await;
    app.add_members("sanjose", &[("kim", "CM"), ("lea", "NEW_FRIEND")]).await;
    let sanjose = app.church("sanjose").await;

    let err = app
        .services
        .reports()
        .dashboard(app.admin("tabak").await, Some(sanjose.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    let dashboard = app
        .services
        .reports()
        .dashboard(app.super_admin().await, Some(sanjose.id))
        .await
        .unwrap();
    assert_eq!(dashboard.church.map(|c| c.domain), Some("sanjose".to_string()));
    assert_eq!(dashboard.counts.total_members, 2);
    assert_eq!(dashboard.counts.new_friends, 1);
    assert_eq!(dashboard.counts.regular_members, 1);
}

#[tokio::test]
async fn test_dashboard_by_domain_follows_same_rules() {
    let app = seeded_app().await;

    let err = app
        .services
        .reports()
        .dashboard_for_domain(app.admin("tabak").await, "christinville")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    let own = app
        .services
        .reports()
        .dashboard_for_domain(app.admin("tabak").await, "tabak")
        .await
        .unwrap();
    assert_eq!(own.counts.total_members, 0);
}

#[tokio::test]
async fn test_new_friend_dashboard_hides_activity() {
    let app = seeded_app().await;
    let friend = app.add_members("tabak", &[("mia", "NEW_FRIEND")]).await.remove(0);

    let dashboard = app
        .services
        .reports()
        .dashboard(friend.principal(), None)
        .await
        .unwrap();
    assert!(dashboard.recent_activity.is_empty());

    let admin_view = app
        .services
        .reports()
        .dashboard(app.admin("tabak").await, None)
        .await
        .unwrap();
    assert!(!admin_view.recent_activity.is_empty());
}

#[tokio::test]
async fn test_role_breakdown_counts_regular_members() {
    let app = seeded_app().await;
    app.add_members(
        "tabak",
        &[("nia", "CM"), ("oli", "CM"), ("pia", "CL"), ("quin", "NEW_FRIEND")],
    )
    .await;

    let dashboard = app
        .services
        .reports()
        .dashboard(app.admin("tabak").await, None)
        .await
        .unwrap();
    assert_eq!(dashboard.counts.total_members, 4);
    assert_eq!(dashboard.counts.regular_members, 3);

    let cm = dashboard
        .counts
        .role_breakdown
        .iter()
        .find(|b| b.role == RoleCode::Cm)
        .unwrap();
    assert_eq!(cm.count, 2);
    assert_eq!(cm.percentage, 66.7);
}

#[tokio::test]
async fn test_statistics_summarize_recent_activity() {
    let app = seeded_app().await;
    let friend = app.add_members("tabak", &[("rae", "NEW_FRIEND")]).await.remove(0);
    let admin = app.admin("tabak").await;

    app.services
        .members()
        .record_attendance(admin, friend.id, client())
        .await
        .unwrap();

    let stats = app.services.reports().statistics(admin, None).await.unwrap();
    assert_eq!(stats.groups.total_groups, 0);
    assert!(!stats.growth.is_empty());
    assert!(stats
        .activity_summary
        .iter()
        .any(|a| a.action == ActivityAction::Attendance && a.count == 1));
}

#[tokio::test]
async fn test_overview_is_super_admin_only() {
    let app = seeded_app().await;

    let err = app
        .services
        .reports()
        .overview(app.admin("tabak").await)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    let overview = app
        .services
        .reports()
        .overview(app.super_admin().await)
        .await
        .unwrap();
    assert_eq!(overview.len(), 6);
}
