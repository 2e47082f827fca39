//! Transactional persistence interface.
//!
//! Engines open one [`StoreTx`] per request, perform every read and write
//! through it, and commit once. Dropping a transaction without committing
//! rolls it back. Implementations must enforce the same uniqueness and
//! foreign-key rules as the PostgreSQL schema so that races are settled by
//! the store, not by application checks.

use async_trait::async_trait;
use qgig_core::documents::DocumentStatus;
use qgig_core::lifecycle::{InterestStatus, JobStatus};
use qgig_core::roles::RoleName;
use qgig_core::types::{DbId, Timestamp};

use crate::models::document::{CreateDocument, Document};
use crate::models::interest::Interest;
use crate::models::job::{CreateJob, Job, JobFilter, UpdateJob};
use crate::models::message::{CreateMessage, Message};
use crate::models::notification::{CreateNotification, Notification};
use crate::models::payment::{CreatePayment, Payment, PaymentSettlement};
use crate::models::profile::{Institution, Professional};
use crate::models::rating::{CreateRating, Rating};
use crate::models::role::{CreateRoleSwitchAudit, Role, RoleSwitchAudit};
use crate::models::session::{CreateSession, UserSession};
use crate::models::user::{CreateUser, User};

/// PostgreSQL SQLSTATE for unique violations.
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for foreign-key violations.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A named unique constraint rejected the write.
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// A foreign key rejected the write or delete.
    #[error("Foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    /// An update targeted a row that does not exist.
    #[error("Row not found")]
    RowNotFound,

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    /// Whether this is a unique violation of the named constraint.
    pub fn is_unique_violation(&self, name: &str) -> bool {
        matches!(self, Self::UniqueViolation { constraint } if constraint == name)
    }

    /// Whether this is a foreign-key violation of the named constraint.
    pub fn is_foreign_key_violation(&self, name: &str) -> bool {
        matches!(self, Self::ForeignKeyViolation { constraint } if constraint == name)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::RowNotFound,
            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                match db_err.code().as_deref() {
                    Some(UNIQUE_VIOLATION) => Self::UniqueViolation { constraint },
                    Some(FOREIGN_KEY_VIOLATION) => Self::ForeignKeyViolation { constraint },
                    _ => Self::Database(err),
                }
            }
            _ => Self::Database(err),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Constraint names shared by every implementation.
pub mod constraints {
    pub const USERS_EMAIL: &str = "uq_users_email";
    pub const INTERESTS_JOB_PROFESSIONAL: &str = "uq_interests_job_id_professional_id";
    pub const PAYMENTS_MERCHANT_REFERENCE: &str = "uq_payments_merchant_reference";
    pub const PAYMENTS_ORDER_TRACKING_ID: &str = "uq_payments_order_tracking_id";
    pub const PAYMENTS_ONE_COMPLETED_PER_JOB: &str = "uq_payments_one_completed_per_job";
    pub const RATINGS_JOB_RATER: &str = "uq_ratings_job_id_rater_user_id";
    pub const PROFESSIONALS_USER: &str = "uq_professionals_user_id";
    pub const INSTITUTIONS_USER: &str = "uq_institutions_user_id";
    pub const SESSIONS_TOKEN_HASH: &str = "uq_user_sessions_token_hash";
    pub const PAYMENTS_JOB_FK: &str = "payments_job_id_fkey";
}

/// Entry point: hands out transactions.
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;

    /// Cheap reachability check.
    async fn health_check(&self) -> StoreResult<()>;
}

/// One atomic unit of work.
#[async_trait]
pub trait StoreTx: Send {
    async fn commit(self: Box<Self>) -> StoreResult<()>;

    // ---- Users -------------------------------------------------------------

    async fn create_user(&mut self, input: &CreateUser) -> StoreResult<User>;
    async fn find_user(&mut self, id: DbId) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<User>>;
    async fn record_login(&mut self, user_id: DbId) -> StoreResult<()>;
    async fn set_user_active(&mut self, user_id: DbId, is_active: bool) -> StoreResult<bool>;

    // ---- Roles -------------------------------------------------------------

    async fn find_role(&mut self, name: RoleName) -> StoreResult<Option<Role>>;
    async fn list_user_roles(&mut self, user_id: DbId) -> StoreResult<Vec<RoleName>>;
    /// Insert a (user, role) membership. Returns `false` if it already existed.
    async fn assign_role(&mut self, user_id: DbId, role: RoleName) -> StoreResult<bool>;
    async fn record_role_switch(
        &mut self,
        input: &CreateRoleSwitchAudit,
    ) -> StoreResult<RoleSwitchAudit>;
    async fn list_role_switches(&mut self, user_id: DbId) -> StoreResult<Vec<RoleSwitchAudit>>;

    // ---- Sessions ----------------------------------------------------------

    async fn create_session(&mut self, input: &CreateSession) -> StoreResult<UserSession>;
    /// Active (not revoked, not expired) session by id.
    async fn find_session(&mut self, id: DbId) -> StoreResult<Option<UserSession>>;
    /// Active session by token hash.
    async fn find_session_by_token_hash(&mut self, hash: &str)
        -> StoreResult<Option<UserSession>>;
    async fn set_session_active_role(&mut self, id: DbId, role: RoleName) -> StoreResult<()>;
    async fn revoke_session(&mut self, id: DbId) -> StoreResult<bool>;
    async fn revoke_all_sessions(&mut self, user_id: DbId) -> StoreResult<u64>;

    // ---- Profiles ----------------------------------------------------------

    async fn create_professional(&mut self, user_id: DbId, full_name: &str)
        -> StoreResult<Professional>;
    async fn find_professional(&mut self, id: DbId) -> StoreResult<Option<Professional>>;
    async fn find_professional_by_user(&mut self, user_id: DbId)
        -> StoreResult<Option<Professional>>;
    async fn create_institution(&mut self, user_id: DbId, name: &str) -> StoreResult<Institution>;
    async fn find_institution(&mut self, id: DbId) -> StoreResult<Option<Institution>>;
    async fn find_institution_by_user(&mut self, user_id: DbId)
        -> StoreResult<Option<Institution>>;

    // ---- Jobs --------------------------------------------------------------

    async fn create_job(&mut self, input: &CreateJob) -> StoreResult<Job>;
    async fn find_job(&mut self, id: DbId) -> StoreResult<Option<Job>>;
    /// Fetch a job and hold a row lock on it until the transaction ends.
    async fn lock_job(&mut self, id: DbId) -> StoreResult<Option<Job>>;
    async fn update_job_details(&mut self, id: DbId, input: &UpdateJob) -> StoreResult<Job>;
    async fn set_job_status(
        &mut self,
        id: DbId,
        status: JobStatus,
        assigned_professional_id: Option<DbId>,
    ) -> StoreResult<Job>;
    /// Delete a job; its interests cascade. Fails with a foreign-key
    /// violation when payments reference it.
    async fn delete_job(&mut self, id: DbId) -> StoreResult<bool>;
    async fn list_open_jobs(&mut self, filter: &JobFilter) -> StoreResult<Vec<Job>>;
    async fn list_jobs_for_institution(&mut self, institution_id: DbId) -> StoreResult<Vec<Job>>;
    async fn list_jobs_assigned_to(&mut self, professional_id: DbId) -> StoreResult<Vec<Job>>;
    /// Open jobs whose expiry date is at or before `now`, locked for update.
    async fn list_expired_open_jobs(&mut self, now: Timestamp) -> StoreResult<Vec<Job>>;

    // ---- Interests ---------------------------------------------------------

    async fn create_interest(&mut self, job_id: DbId, professional_id: DbId)
        -> StoreResult<Interest>;
    async fn find_interest(&mut self, id: DbId) -> StoreResult<Option<Interest>>;
    async fn find_interest_for(
        &mut self,
        job_id: DbId,
        professional_id: DbId,
    ) -> StoreResult<Option<Interest>>;
    async fn set_interest_status(&mut self, id: DbId, status: InterestStatus)
        -> StoreResult<Interest>;
    async fn delete_interest(&mut self, id: DbId) -> StoreResult<bool>;
    async fn list_interests_for_job(&mut self, job_id: DbId) -> StoreResult<Vec<Interest>>;
    async fn list_interests_for_professional(
        &mut self,
        professional_id: DbId,
    ) -> StoreResult<Vec<Interest>>;

    // ---- Notifications -----------------------------------------------------

    async fn create_notification(&mut self, input: &CreateNotification)
        -> StoreResult<Notification>;
    async fn find_notification(&mut self, id: DbId) -> StoreResult<Option<Notification>>;
    async fn list_notifications(
        &mut self,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Notification>>;
    async fn count_unread_notifications(&mut self, user_id: DbId) -> StoreResult<i64>;
    async fn mark_notification_read(&mut self, id: DbId) -> StoreResult<bool>;
    async fn mark_all_notifications_read(&mut self, user_id: DbId) -> StoreResult<u64>;
    async fn delete_notification(&mut self, id: DbId) -> StoreResult<bool>;
    /// Delete the user's notifications, restricted to `ids` when given.
    async fn delete_notifications_for_user(
        &mut self,
        user_id: DbId,
        ids: Option<&[DbId]>,
    ) -> StoreResult<u64>;

    // ---- Payments ----------------------------------------------------------

    async fn create_payment(&mut self, input: &CreatePayment) -> StoreResult<Payment>;
    async fn find_payment(&mut self, id: DbId) -> StoreResult<Option<Payment>>;
    /// Fetch a payment and hold a row lock on it.
    async fn lock_payment(&mut self, id: DbId) -> StoreResult<Option<Payment>>;
    /// Fetch a payment by gateway tracking id and hold a row lock on it.
    async fn lock_payment_by_tracking_id(&mut self, tracking_id: &str)
        -> StoreResult<Option<Payment>>;
    async fn list_payments_for_job(&mut self, job_id: DbId) -> StoreResult<Vec<Payment>>;
    async fn list_payments_for_institution(&mut self, institution_id: DbId)
        -> StoreResult<Vec<Payment>>;
    async fn list_payments_for_professional(
        &mut self,
        professional_id: DbId,
    ) -> StoreResult<Vec<Payment>>;
    async fn set_payment_order(
        &mut self,
        id: DbId,
        tracking_id: &str,
        redirect_url: Option<&str>,
    ) -> StoreResult<Payment>;
    async fn settle_payment(&mut self, id: DbId, settlement: &PaymentSettlement)
        -> StoreResult<Payment>;

    // ---- Ratings -----------------------------------------------------------

    async fn create_rating(&mut self, input: &CreateRating) -> StoreResult<Rating>;
    async fn find_rating_by_rater(&mut self, job_id: DbId, rater_user_id: DbId)
        -> StoreResult<Option<Rating>>;
    async fn list_ratings_for_user(&mut self, rated_user_id: DbId) -> StoreResult<Vec<Rating>>;

    // ---- Messages ----------------------------------------------------------

    async fn create_message(&mut self, input: &CreateMessage) -> StoreResult<Message>;
    async fn find_message(&mut self, id: DbId) -> StoreResult<Option<Message>>;
    /// Messages between two users, oldest first, excluding ones `user_id` hid.
    async fn list_conversation(&mut self, user_id: DbId, other_user_id: DbId)
        -> StoreResult<Vec<Message>>;
    async fn count_unread_messages(&mut self, user_id: DbId) -> StoreResult<i64>;
    async fn mark_message_read(&mut self, id: DbId) -> StoreResult<bool>;
    /// Soft-delete a message for one side of the conversation.
    async fn hide_message(&mut self, id: DbId, for_sender: bool) -> StoreResult<bool>;

    // ---- Documents ---------------------------------------------------------

    async fn create_document(&mut self, input: &CreateDocument) -> StoreResult<Document>;
    async fn find_document(&mut self, id: DbId) -> StoreResult<Option<Document>>;
    async fn list_documents_for_user(&mut self, user_id: DbId) -> StoreResult<Vec<Document>>;
    async fn list_pending_documents(&mut self) -> StoreResult<Vec<Document>>;
    async fn review_document(
        &mut self,
        id: DbId,
        status: DocumentStatus,
        reviewer_id: DbId,
        notes: Option<&str>,
    ) -> StoreResult<Document>;
}
