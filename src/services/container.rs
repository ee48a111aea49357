//! Service Container - Centralized service access with parallel execution support.
//!
//! Handlers depend on the [`ServiceContainer`] trait, never on concrete
//! service types, so a test can wire its own implementations.

use std::future::Future;
use std::sync::Arc;

use super::{
    ActivityService, AuthService, ChurchService, GroupService, MemberService, ReportService,
    SetupService, TransferService,
};
use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::Persistence;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    /// Church registry and email-based church detection
    fn churches(&self) -> Arc<dyn ChurchService>;

    fn members(&self) -> Arc<dyn MemberService>;

    /// Groups and group membership
    fn groups(&self) -> Arc<dyn GroupService>;

    fn activity(&self) -> Arc<dyn ActivityService>;

    /// Dashboards and statistics
    fn reports(&self) -> Arc<dyn ReportService>;

    /// CSV, XLSX and JSON import/export
    fn transfer(&self) -> Arc<dyn TransferService>;

    fn setup(&self) -> Arc<dyn SetupService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<dyn AuthService>,
    pub churches: Arc<dyn ChurchService>,
    pub members: Arc<dyn MemberService>,
    pub groups: Arc<dyn GroupService>,
    pub activity: Arc<dyn ActivityService>,
    pub reports: Arc<dyn ReportService>,
    pub transfer: Arc<dyn TransferService>,
    pub setup: Arc<dyn SetupService>,
}

impl Services {
    /// Create service container from database connection and config
    pub fn from_connection(db: sea_orm::DatabaseConnection, config: Config) -> Self {
        use super::{
            ActivityReader, Authenticator, ChurchManager, GroupManager, MemberManager, Reporter,
            Setup, Transfer,
        };

        let uow = Arc::new(Persistence::new(db));
        let email_domain = config.email_domain.clone();

        Self {
            churches: Arc::new(ChurchManager::new(uow.clone(), email_domain.clone())),
            members: Arc::new(MemberManager::new(uow.clone())),
            groups: Arc::new(GroupManager::new(uow.clone())),
            activity: Arc::new(ActivityReader::new(uow.clone())),
            reports: Arc::new(Reporter::new(uow.clone())),
            transfer: Arc::new(Transfer::new(uow.clone(), email_domain.clone())),
            setup: Arc::new(Setup::new(uow.clone(), email_domain)),
            auth: Arc::new(Authenticator::new(uow, config)),
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth.clone()
    }

    fn churches(&self) -> Arc<dyn ChurchService> {
        self.churches.clone()
    }

    fn members(&self) -> Arc<dyn MemberService> {
        self.members.clone()
    }

    fn groups(&self) -> Arc<dyn GroupService> {
        self.groups.clone()
    }

    fn activity(&self) -> Arc<dyn ActivityService> {
        self.activity.clone()
    }

    fn reports(&self) -> Arc<dyn ReportService> {
        self.reports.clone()
    }

    fn transfer(&self) -> Arc<dyn TransferService> {
        self.transfer.clone()
    }

    fn setup(&self) -> Arc<dyn SetupService> {
        self.setup.clone()
    }
}

/// Parallel execution utilities for running independent operations concurrently.
///
/// Only use these with reads through repository stores; a transaction
/// context holds a single connection and cannot be shared.
pub mod parallel {
    use super::*;
    use tokio::try_join;

    /// Execute two independent async operations in parallel.
    ///
    /// If either operation fails, the error is returned immediately.
    ///
    /// # Example
    /// ```ignore
    /// let (by_role, by_type) = parallel::join2(
    ///     uow.users().count_by_role(scope),
    ///     uow.groups().count_by_type(scope),
    /// ).await?;
    /// ```
    pub async fn join2<F1, F2, T1, T2>(f1: F1, f2: F2) -> AppResult<(T1, T2)>
    where
        F1: Future<Output = AppResult<T1>>,
        F2: Future<Output = AppResult<T2>>,
    {
        try_join!(f1, f2)
    }

    /// Execute four independent async operations in parallel.
    pub async fn join4<F1, F2, F3, F4, T1, T2, T3, T4>(
        f1: F1,
        f2: F2,
        f3: F3,
        f4: F4,
    ) -> AppResult<(T1, T2, T3, T4)>
    where
        F1: Future<Output = AppResult<T1>>,
        F2: Future<Output = AppResult<T2>>,
        F3: Future<Output = AppResult<T3>>,
        F4: Future<Output = AppResult<T4>>,
    {
        try_join!(f1, f2, f3, f4)
    }

    /// Execute a collection of homogeneous async operations in parallel.
    ///
    /// Results are returned in the same order as the input futures.
    pub async fn join_all<F, T>(futures: Vec<F>) -> AppResult<Vec<T>>
    where
        F: Future<Output = AppResult<T>>,
    {
        let results = futures::future::join_all(futures).await;
        results.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use tokio_test::{assert_err, assert_ok, block_on};

    #[tokio::test]
    async fn test_parallel_join2() {
        async fn op1() -> AppResult<i32> {
            Ok(1)
        }
        async fn op2() -> AppResult<&'static str> {
            Ok("two")
        }

        let (a, b) = parallel::join2(op1(), op2()).await.unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, "two");
    }

    #[tokio::test]
    async fn test_parallel_join_all_keeps_order() {
        let futures: Vec<_> = (0..5).map(|i| async move { Ok(i) as AppResult<i32> }).collect();
        let results = parallel::join_all(futures).await.unwrap();
        assert_eq!(results, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_parallel_join_all_fails_on_any_error() {
        let futures: Vec<_> = (0..3)
            .map(|i| async move {
                if i == 1 {
                    Err(AppError::not_found("Church"))
                } else {
                    Ok(i)
                }
            })
            .collect();
        let err = assert_err!(block_on(parallel::join_all(futures)));
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_parallel_join4_first_error_wins() {
        async fn count(n: u64) -> AppResult<u64> {
            Ok(n)
        }
        async fn denied() -> AppResult<u64> {
            Err(AppError::denied("view activity"))
        }

        let counts = assert_ok!(block_on(parallel::join4(count(1), count(2), count(3), count(4))));
        assert_eq!(counts, (1, 2, 3, 4));

        let err = assert_err!(block_on(parallel::join4(count(1), denied(), count(3), count(4))));
        assert!(matches!(err, AppError::PermissionDenied(_)));
    }
}
