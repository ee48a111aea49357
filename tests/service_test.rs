//! Service unit tests over mocked repositories.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use mockall::predicate::eq;
use uuid::Uuid;

use church_admin::domain::{Church, Group, GroupType, NewChurch, Principal, RoleCode};
use church_admin::errors::{AppError, AppResult};
use church_admin::infra::{
    ActivityRepository, ChurchRepository, GroupRepository, MemberRepository,
    MockActivityRepository, MockChurchRepository, MockGroupRepository, MockMemberRepository,
    MockRoleRepository, MockUserRepository, RoleRepository, TransactionContext, UnitOfWork,
    UserRepository,
};
use church_admin::services::{
    ActivityQuery, ActivityReader, ActivityService, ChurchManager, ChurchService, GroupManager,
    GroupService, ReportService, Reporter,
};
use church_admin::types::PaginationParams;

fn create_test_church(domain: &str, is_active: bool) -> Church {
    Church {
        id: Uuid::new_v4(),
        name: format!("JCSGO {}", domain),
        domain: domain.to_string(),
        location: "Rizal".to_string(),
        region: "Region 4A".to_string(),
        is_active,
        allow_public_registration: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn create_test_group(id: Uuid, church_id: Uuid, capacity: i32) -> Group {
    Group {
        id,
        church_id,
        name: "Care Group".to_string(),
        group_type: GroupType::Care,
        leader_id: None,
        capacity,
        meeting_time: None,
        description: None,
        is_active: true,
        created_at: Utc::now(),
    }
}

fn principal(church_id: Uuid, role: RoleCode) -> Principal {
    Principal {
        user_id: Uuid::new_v4(),
        church_id,
        role,
    }
}

/// Test mock for UnitOfWork; each repository defaults to a mock with no
/// expectations, so any unexpected call fails the test.
#[derive(Default)]
struct TestUnitOfWork {
    churches: MockChurchRepository,
    roles: MockRoleRepository,
    users: MockUserRepository,
    members: MockMemberRepository,
    groups: MockGroupRepository,
    activity: MockActivityRepository,
}

struct SharedUnitOfWork {
    churches: Arc<MockChurchRepository>,
    roles: Arc<MockRoleRepository>,
    users: Arc<MockUserRepository>,
    members: Arc<MockMemberRepository>,
    groups: Arc<MockGroupRepository>,
    activity: Arc<MockActivityRepository>,
}

impl TestUnitOfWork {
    fn build(self) -> Arc<SharedUnitOfWork> {
        Arc::new(SharedUnitOfWork {
            churches: Arc::new(self.churches),
            roles: Arc::new(self.roles),
            users: Arc::new(self.users),
            members: Arc::new(self.members),
            groups: Arc::new(self.groups),
            activity: Arc::new(self.activity),
        })
    }
}

#[async_trait]
impl UnitOfWork for SharedUnitOfWork {
    fn churches(&self) -> Arc<dyn ChurchRepository> {
        self.churches.clone()
    }

    fn roles(&self) -> Arc<dyn RoleRepository> {
        self.roles.clone()
    }

    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn members(&self) -> Arc<dyn MemberRepository> {
        self.members.clone()
    }

    fn groups(&self) -> Arc<dyn GroupRepository> {
        self.groups.clone()
    }

    fn activity(&self) -> Arc<dyn ActivityRepository> {
        self.activity.clone()
    }

    async fn transaction<F, T>(&self, _f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        // Transaction not supported in test mock
        Err(AppError::internal("Transactions not supported in test mock"))
    }

    async fn transaction_serializable<F, T>(&self, _f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        // Transaction not supported in test mock
        Err(AppError::internal("Transactions not supported in test mock"))
    }
}

#[tokio::test]
async fn test_detect_church_from_email() {
    let mut uow = TestUnitOfWork::default();
    uow.churches
        .expect_find_by_domain()
        .withf(|domain| domain == "tabak")
        .returning(|domain| Ok(Some(create_test_church(domain, true))));

    let service = ChurchManager::new(uow.build(), "jcsgo.com");
    let church = service.detect_from_email("Ana@Tabak.jcsgo.com").await.unwrap();

    assert_eq!(church.domain, "tabak");
}

#[tokio::test]
async fn test_detect_inactive_church_not_found() {
    let mut uow = TestUnitOfWork::default();
    uow.churches
        .expect_find_by_domain()
        .returning(|domain| Ok(Some(create_test_church(domain, false))));

    let service = ChurchManager::new(uow.build(), "jcsgo.com");
    let result = service.detect_from_email("ana@tabak.jcsgo.com").await;

    assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
}

#[tokio::test]
async fn test_detect_rejects_foreign_address_without_lookup() {
    let service = ChurchManager::new(TestUnitOfWork::default().build(), "jcsgo.com");
    let result = service.detect_from_email("ana@gmail.com").await;

    assert!(matches!(result.unwrap_err(), AppError::Validation(_)));
}

#[tokio::test]
async fn test_church_admin_cannot_create_churches() {
    let service = ChurchManager::new(TestUnitOfWork::default().build(), "jcsgo.com");
    let admin = principal(Uuid::new_v4(), RoleCode::Admin);

    let result = service
        .create(
            admin,
            NewChurch {
                name: "New Branch".to_string(),
                domain: "newbranch".to_string(),
                location: "Pasig".to_string(),
                region: "Central Region".to_string(),
            },
        )
        .await;

    assert!(matches!(result.unwrap_err(), AppError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_zero_capacity_is_rejected_before_counting_members() {
    let church_id = Uuid::new_v4();
    let group_id = Uuid::new_v4();

    // No member repository expectations: the count must not be read
    let mut uow = TestUnitOfWork::default();
    uow.groups
        .expect_find_by_id()
        .with(eq(group_id))
        .returning(move |id| Ok(Some(create_test_group(id, church_id, 12))));

    let service = GroupManager::new(uow.build());
    let leader = principal(church_id, RoleCode::Csl);
    let result = service.update_capacity(leader, group_id, 0).await;

    assert!(matches!(result.unwrap_err(), AppError::Validation(_)));
}

#[tokio::test]
async fn test_capacity_change_runs_in_a_transaction() {
    let church_id = Uuid::new_v4();
    let group_id = Uuid::new_v4();

    let mut uow = TestUnitOfWork::default();
    uow.groups
        .expect_find_by_id()
        .returning(move |id| Ok(Some(create_test_group(id, church_id, 12))));
    uow.groups.expect_update_capacity().never();
    uow.members.expect_count_in_group().never();

    let service = GroupManager::new(uow.build());
    let result = service
        .update_capacity(principal(church_id, RoleCode::Csl), group_id, 20)
        .await;

    // The mock unit of work refuses transactions
    assert!(matches!(result.unwrap_err(), AppError::Internal(_)));
}

#[tokio::test]
async fn test_care_leader_cannot_resize_groups() {
    let church_id = Uuid::new_v4();
    let group_id = Uuid::new_v4();

    let mut uow = TestUnitOfWork::default();
    uow.groups
        .expect_find_by_id()
        .returning(move |id| Ok(Some(create_test_group(id, church_id, 12))));

    let service = GroupManager::new(uow.build());
    let result = service
        .update_capacity(principal(church_id, RoleCode::Cl), group_id, 20)
        .await;

    assert!(matches!(result.unwrap_err(), AppError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_new_friend_cannot_read_activity() {
    let service = ActivityReader::new(TestUnitOfWork::default().build());
    let friend = principal(Uuid::new_v4(), RoleCode::NewFriend);

    let result = service
        .list(friend, ActivityQuery::default(), PaginationParams::default())
        .await;

    assert!(matches!(result.unwrap_err(), AppError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_dashboard_leaves_staff_out_of_member_counts() {
    let church = create_test_church("tabak", true);
    let church_id = church.id;

    let mut uow = TestUnitOfWork::default();
    uow.churches
        .expect_find_by_id()
        .with(eq(church_id))
        .returning(move |_| Ok(Some(church.clone())));
    uow.users
        .expect_count_by_role()
        .with(eq(Some(church_id)))
        .returning(|_| {
            Ok(vec![
                (RoleCode::Admin, 1),
                (RoleCode::Cm, 3),
                (RoleCode::Cl, 1),
                (RoleCode::NewFriend, 2),
            ])
        });
    uow.groups
        .expect_count_by_type()
        .returning(|_| Ok(vec![(GroupType::Care, 2), (GroupType::Ministry, 1)]));
    uow.activity
        .expect_recent()
        .times(1)
        .returning(|_, _| Ok(vec![]));

    let service = Reporter::new(uow.build());
    let dashboard = service
        .dashboard(principal(church_id, RoleCode::Admin), None)
        .await
        .unwrap();

    assert_eq!(dashboard.counts.total_members, 6);
    assert_eq!(dashboard.counts.new_friends, 2);
    assert_eq!(dashboard.counts.regular_members, 4);
    assert_eq!(dashboard.active_groups, 3);
}
