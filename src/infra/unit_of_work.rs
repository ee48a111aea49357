//! Unit of Work pattern implementation.
//!
//! Centralizes access to the repositories and manages the transaction
//! lifecycle, so multi-step workflows (registration, promotion, group
//! membership changes, one imported row) commit or roll back as a whole.

use async_trait::async_trait;
use sea_orm::{
    AccessMode, DatabaseConnection, DatabaseTransaction, IsolationLevel, TransactionTrait,
};
use std::sync::Arc;

use super::repositories::{
    ActivityQueries, ActivityRepository, ActivityStore, ChurchQueries, ChurchRepository,
    ChurchStore, GroupQueries, GroupRepository, GroupStore, MemberQueries, MemberRepository,
    MemberStore, RoleQueries, RoleRepository, RoleStore, UserQueries, UserRepository, UserStore,
};
use crate::errors::{AppError, AppResult};

/// Unit of Work trait for dependency injection.
///
/// Not mockable directly due to the generic transaction methods;
/// mock at the service level or use an in-memory database instead.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn churches(&self) -> Arc<dyn ChurchRepository>;

    fn roles(&self) -> Arc<dyn RoleRepository>;

    fn users(&self) -> Arc<dyn UserRepository>;

    /// New friend and regular member profiles
    fn members(&self) -> Arc<dyn MemberRepository>;

    fn groups(&self) -> Arc<dyn GroupRepository>;

    fn activity(&self) -> Arc<dyn ActivityRepository>;

    /// Execute a closure within a transaction.
    ///
    /// The transaction is committed on success or rolled back on error.
    /// Uses ReadCommitted isolation.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send;

    /// Execute a closure within a transaction with serializable isolation.
    ///
    /// Used where a read decides a write, such as the capacity check
    /// before a group join.
    async fn transaction_serializable<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send;
}

/// Transaction context providing repository access within a transaction.
///
/// Every query made through this context joins the same database
/// transaction. The context borrows the transaction, so it cannot
/// outlive it.
pub struct TransactionContext<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TransactionContext<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    pub fn churches(&self) -> ChurchQueries<'_, DatabaseTransaction> {
        ChurchQueries::new(self.txn)
    }

    pub fn roles(&self) -> RoleQueries<'_, DatabaseTransaction> {
        RoleQueries::new(self.txn)
    }

    pub fn users(&self) -> UserQueries<'_, DatabaseTransaction> {
        UserQueries::new(self.txn)
    }

    pub fn members(&self) -> MemberQueries<'_, DatabaseTransaction> {
        MemberQueries::new(self.txn)
    }

    pub fn groups(&self) -> GroupQueries<'_, DatabaseTransaction> {
        GroupQueries::new(self.txn)
    }

    pub fn activity(&self) -> ActivityQueries<'_, DatabaseTransaction> {
        ActivityQueries::new(self.txn)
    }
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    db: DatabaseConnection,
    church_repo: Arc<ChurchStore>,
    role_repo: Arc<RoleStore>,
    user_repo: Arc<UserStore>,
    member_repo: Arc<MemberStore>,
    group_repo: Arc<GroupStore>,
    activity_repo: Arc<ActivityStore>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            church_repo: Arc::new(ChurchStore::new(db.clone())),
            role_repo: Arc::new(RoleStore::new(db.clone())),
            user_repo: Arc::new(UserStore::new(db.clone())),
            member_repo: Arc::new(MemberStore::new(db.clone())),
            group_repo: Arc::new(GroupStore::new(db.clone())),
            activity_repo: Arc::new(ActivityStore::new(db.clone())),
            db,
        }
    }

    /// Internal transaction execution with configurable isolation level
    async fn execute_transaction<F, T>(&self, isolation: IsolationLevel, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        let txn = self
            .db
            .begin_with_config(Some(isolation), Some(AccessMode::ReadWrite))
            .await
            .map_err(AppError::from)?;

        let ctx = TransactionContext::new(&txn);

        match f(ctx).await {
            Ok(result) => {
                txn.commit().await.map_err(AppError::from)?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn churches(&self) -> Arc<dyn ChurchRepository> {
        self.church_repo.clone()
    }

    fn roles(&self) -> Arc<dyn RoleRepository> {
        self.role_repo.clone()
    }

    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn members(&self) -> Arc<dyn MemberRepository> {
        self.member_repo.clone()
    }

    fn groups(&self) -> Arc<dyn GroupRepository> {
        self.group_repo.clone()
    }

    fn activity(&self) -> Arc<dyn ActivityRepository> {
        self.activity_repo.clone()
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        self.execute_transaction(IsolationLevel::ReadCommitted, f).await
    }

    async fn transaction_serializable<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        self.execute_transaction(IsolationLevel::Serializable, f).await
    }
}

/// Run the body inside `UnitOfWork::transaction`.
#[macro_export]
macro_rules! with_transaction {
    ($uow:expr, |$ctx:ident| $body:expr) => {
        $uow.transaction(|$ctx| Box::pin(async move { $body })).await
    };
}
