//! New friend tracking and role changes against a seeded database.

mod common;

use church_admin::domain::{
    ActivityAction, FollowUpStatus, MemberProfile, RoleCode, TimerStatus,
};
use church_admin::errors::AppError;
use church_admin::services::{
    ActivityQuery, FollowUpUpdate, MemberQuery, ServiceContainer,
};
use church_admin::types::PaginationParams;

use common::{client, seeded_app};

fn timer(value: u8) -> TimerStatus {
    TimerStatus::new(value).unwrap()
}

#[tokio::test]
async fn test_timer_status_updates_until_promotion() {
    let app = seeded_app().await;
    let users = app
        .add_members("tabak", &[("nina", "NEW_FRIEND"), ("leo", "CL")])
        .await;
    let (friend, leader) = (&users[0], users[1].principal());
    let members = app.services.members();

    let update = members
        .update_timer_status(leader, friend.id, timer(3), client())
        .await
        .unwrap();
    assert!(!update.promoted);
    assert_eq!(update.timer_status, Some(timer(3)));
    assert_eq!(update.user.role, RoleCode::NewFriend);

    let update = members
        .update_timer_status(leader, friend.id, timer(5), client())
        .await
        .unwrap();
    assert!(update.promoted);
    assert_eq!(update.timer_status, None);
    assert_eq!(update.user.role, RoleCode::Cm);

    let detail = members.get_member(leader, friend.id).await.unwrap();
    match detail.profile {
        MemberProfile::Regular(profile) => assert_eq!(profile.role_type, RoleCode::Cm),
        other => panic!("expected a regular member profile, got {:?}", other),
    }
    assert!(app.user("nina@tabak.jcsgo.com").await.transition_date.is_some());

    let friends = members
        .list_new_friends(leader, MemberQuery::default(), PaginationParams::default())
        .await
        .unwrap();
    assert_eq!(friends.meta.total, 0);

    let promotions = app
        .services
        .activity()
        .list(
            app.admin("tabak").await,
            ActivityQuery {
                action: Some(ActivityAction::RoleChange),
                user_id: Some(friend.id),
                ..ActivityQuery::default()
            },
            PaginationParams::default(),
        )
        .await
        .unwrap();
    assert_eq!(promotions.meta.total, 1);
}

#[tokio::test]
async fn test_timer_status_requires_a_new_friend_and_a_leader() {
    let app = seeded_app().await;
    let users = app
        .add_members("tabak", &[("omar", "CM"), ("pam", "NEW_FRIEND")])
        .await;
    let members = app.services.members();

    let err = members
        .update_timer_status(app.admin("tabak").await, users[0].id, timer(2), client())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // A CM ranks below the care leaders who track new friends
    let err = members
        .update_timer_status(users[0].principal(), users[1].id, timer(2), client())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    assert!(TimerStatus::new(6).is_err());
}

#[tokio::test]
async fn test_follow_up_is_recorded() {
    let app = seeded_app().await;
    let users = app
        .add_members("tabak", &[("rina", "NEW_FRIEND"), ("sam", "CL")])
        .await;
    let (friend, leader) = (&users[0], users[1].principal());

    let profile = app
        .services
        .members()
        .update_follow_up(
            leader,
            friend.id,
            FollowUpUpdate {
                status: FollowUpStatus::Contacted,
                notes: Some("Called after Sunday service".to_string()),
            },
            client(),
        )
        .await
        .unwrap();
    assert_eq!(profile.follow_up_status, FollowUpStatus::Contacted);
    assert_eq!(profile.follow_up_notes.as_deref(), Some("Called after Sunday service"));
    assert!(profile.last_follow_up.is_some());

    let err = app
        .services
        .members()
        .update_follow_up(
            app.admin("sanjose").await,
            friend.id,
            FollowUpUpdate {
                status: FollowUpStatus::Engaged,
                notes: None,
            },
            client(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_role_change_moves_profile() {
    let app = seeded_app().await;
    let friend = app.add_members("tabak", &[("tina", "NEW_FRIEND")]).await.remove(0);
    let admin = app.admin("tabak").await;
    let members = app.services.members();

    let updated = members
        .change_role(admin, friend.id, RoleCode::Csl, client())
        .await
        .unwrap();
    assert_eq!(updated.role, RoleCode::Csl);

    let detail = members.get_member(admin, friend.id).await.unwrap();
    assert!(matches!(
        detail.profile,
        MemberProfile::Regular(ref profile) if profile.role_type == RoleCode::Csl
    ));

    members
        .change_role(admin, friend.id, RoleCode::NewFriend, client())
        .await
        .unwrap();
    let detail = members.get_member(admin, friend.id).await.unwrap();
    assert!(matches!(detail.profile, MemberProfile::NewFriend(_)));
}

#[tokio::test]
async fn test_role_change_respects_level_ceiling() {
    let app = seeded_app().await;
    let users = app
        .add_members("tabak", &[("ursa", "CM"), ("vic", "VSL")])
        .await;
    let admin = app.admin("tabak").await;
    let super_admin = app.super_admin().await;
    let members = app.services.members();

    let err = members
        .change_role(admin, users[0].id, RoleCode::SuperAdmin, client())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    // Leaders below ADMIN may not change roles at all
    let err = members
        .change_role(users[1].principal(), users[0].id, RoleCode::Cl, client())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    let err = members
        .change_role(admin, super_admin.user_id, RoleCode::Cm, client())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    // Only a super admin promotes to super admin, across churches
    let promoted = members
        .change_role(super_admin, users[0].id, RoleCode::SuperAdmin, client())
        .await
        .unwrap();
    assert_eq!(promoted.role, RoleCode::SuperAdmin);
    let detail = members.get_member(super_admin, users[0].id).await.unwrap();
    assert_eq!(detail.profile, MemberProfile::Staff);
}
