//! PostgreSQL-backed [`Store`].

use async_trait::async_trait;
use qgig_core::documents::DocumentStatus;
use qgig_core::lifecycle::{InterestStatus, JobStatus};
use qgig_core::roles::RoleName;
use qgig_core::types::{DbId, Timestamp};
use sqlx::{Postgres, Transaction};

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
use crate::repositories::{
    DocumentRepo, InstitutionRepo, InterestRepo, JobRepo, MessageRepo, NotificationRepo,
    PaymentRepo, ProfessionalRepo, RatingRepo, RoleRepo, SessionRepo, UserRepo,
};
use crate::store::{Store, StoreResult, StoreTx};
use crate::DbPool;

/// Store that opens a database transaction per unit of work.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn health_check(&self) -> StoreResult<()> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }
}

/// An open PostgreSQL transaction. Rolled back on drop unless committed.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    // ---- Users -------------------------------------------------------------

    async fn create_user(&mut self, input: &CreateUser) -> StoreResult<User> {
        Ok(UserRepo::create(&mut self.tx, input).await?)
    }

    async fn find_user(&mut self, id: DbId) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_id(&mut self.tx, id).await?)
    }

    async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_email(&mut self.tx, email).await?)
    }

    async fn record_login(&mut self, user_id: DbId) -> StoreResult<()> {
        Ok(UserRepo::record_login(&mut self.tx, user_id).await?)
    }

    async fn set_user_active(&mut self, user_id: DbId, is_active: bool) -> StoreResult<bool> {
        Ok(UserRepo::set_active(&mut self.tx, user_id, is_active).await?)
    }

    // ---- Roles -------------------------------------------------------------

    async fn find_role(&mut self, name: RoleName) -> StoreResult<Option<Role>> {
        Ok(RoleRepo::find_by_name(&mut self.tx, name).await?)
    }

    async fn list_user_roles(&mut self, user_id: DbId) -> StoreResult<Vec<RoleName>> {
        Ok(RoleRepo::list_for_user(&mut self.tx, user_id).await?)
    }

    async fn assign_role(&mut self, user_id: DbId, role: RoleName) -> StoreResult<bool> {
        Ok(RoleRepo::assign(&mut self.tx, user_id, role).await?)
    }

    async fn record_role_switch(
        &mut self,
        input: &CreateRoleSwitchAudit,
    ) -> StoreResult<RoleSwitchAudit> {
        Ok(RoleRepo::record_switch(&mut self.tx, input).await?)
    }

    async fn list_role_switches(&mut self, user_id: DbId) -> StoreResult<Vec<RoleSwitchAudit>> {
        Ok(RoleRepo::list_switches(&mut self.tx, user_id).await?)
    }

    // ---- Sessions ----------------------------------------------------------

    async fn create_session(&mut self, input: &CreateSession) -> StoreResult<UserSession> {
        Ok(SessionRepo::create(&mut self.tx, input).await?)
    }

    async fn find_session(&mut self, id: DbId) -> StoreResult<Option<UserSession>> {
        Ok(SessionRepo::find_active(&mut self.tx, id).await?)
    }

    async fn find_session_by_token_hash(
        &mut self,
        hash: &str,
    ) -> StoreResult<Option<UserSession>> {
        Ok(SessionRepo::find_by_token_hash(&mut self.tx, hash).await?)
    }

    async fn set_session_active_role(&mut self, id: DbId, role: RoleName) -> StoreResult<()> {
        Ok(SessionRepo::set_active_role(&mut self.tx, id, role).await?)
    }

    async fn revoke_session(&mut self, id: DbId) -> StoreResult<bool> {
        Ok(SessionRepo::revoke(&mut self.tx, id).await?)
    }

    async fn revoke_all_sessions(&mut self, user_id: DbId) -> StoreResult<u64> {
        Ok(SessionRepo::revoke_all_for_user(&mut self.tx, user_id).await?)
    }

    // ---- Profiles ----------------------------------------------------------

    async fn create_professional(
        &mut self,
        user_id: DbId,
        full_name: &str,
    ) -> StoreResult<Professional> {
        Ok(ProfessionalRepo::create(&mut self.tx, user_id, full_name).await?)
    }

    async fn find_professional(&mut self, id: DbId) -> StoreResult<Option<Professional>> {
        Ok(ProfessionalRepo::find_by_id(&mut self.tx, id).await?)
    }

    async fn find_professional_by_user(
        &mut self,
        user_id: DbId,
    ) -> StoreResult<Option<Professional>> {
        Ok(ProfessionalRepo::find_by_user(&mut self.tx, user_id).await?)
    }

    async fn create_institution(&mut self, user_id: DbId, name: &str) -> StoreResult<Institution> {
        Ok(InstitutionRepo::create(&mut self.tx, user_id, name).await?)
    }

    async fn find_institution(&mut self, id: DbId) -> StoreResult<Option<Institution>> {
        Ok(InstitutionRepo::find_by_id(&mut self.tx, id).await?)
    }

    async fn find_institution_by_user(
        &mut self,
        user_id: DbId,
    ) -> StoreResult<Option<Institution>> {
        Ok(InstitutionRepo::find_by_user(&mut self.tx, user_id).await?)
    }

    // ---- Jobs --------------------------------------------------------------

    async fn create_job(&mut self, input: &CreateJob) -> StoreResult<Job> {
        Ok(JobRepo::create(&mut self.tx, input).await?)
    }

    async fn find_job(&mut self, id: DbId) -> StoreResult<Option<Job>> {
        Ok(JobRepo::find_by_id(&mut self.tx, id).await?)
    }

    async fn lock_job(&mut self, id: DbId) -> StoreResult<Option<Job>> {
        Ok(JobRepo::find_for_update(&mut self.tx, id).await?)
    }

    async fn update_job_details(&mut self, id: DbId, input: &UpdateJob) -> StoreResult<Job> {
        Ok(JobRepo::update_details(&mut self.tx, id, input).await?)
    }

    async fn set_job_status(
        &mut self,
        id: DbId,
        status: JobStatus,
        assigned_professional_id: Option<DbId>,
    ) -> StoreResult<Job> {
        Ok(JobRepo::set_status(&mut self.tx, id, status, assigned_professional_id).await?)
    }

    async fn delete_job(&mut self, id: DbId) -> StoreResult<bool> {
        Ok(JobRepo::delete(&mut self.tx, id).await?)
    }

    async fn list_open_jobs(&mut self, filter: &JobFilter) -> StoreResult<Vec<Job>> {
        Ok(JobRepo::list_open(&mut self.tx, filter).await?)
    }

    async fn list_jobs_for_institution(&mut self, institution_id: DbId) -> StoreResult<Vec<Job>> {
        Ok(JobRepo::list_for_institution(&mut self.tx, institution_id).await?)
    }

    async fn list_jobs_assigned_to(&mut self, professional_id: DbId) -> StoreResult<Vec<Job>> {
        Ok(JobRepo::list_assigned_to(&mut self.tx, professional_id).await?)
    }

    async fn list_expired_open_jobs(&mut self, now: Timestamp) -> StoreResult<Vec<Job>> {
        Ok(JobRepo::list_expired_open(&mut self.tx, now).await?)
    }

    // ---- Interests ---------------------------------------------------------

    async fn create_interest(
        &mut self,
        job_id: DbId,
        professional_id: DbId,
    ) -> StoreResult<Interest> {
        Ok(InterestRepo::create(&mut self.tx, job_id, professional_id).await?)
    }

    async fn find_interest(&mut self, id: DbId) -> StoreResult<Option<Interest>> {
        Ok(InterestRepo::find_by_id(&mut self.tx, id).await?)
    }

    async fn find_interest_for(
        &mut self,
        job_id: DbId,
        professional_id: DbId,
    ) -> StoreResult<Option<Interest>> {
        Ok(InterestRepo::find_for_pair(&mut self.tx, job_id, professional_id).await?)
    }

    async fn set_interest_status(
        &mut self,
        id: DbId,
        status: InterestStatus,
    ) -> StoreResult<Interest> {
        Ok(InterestRepo::set_status(&mut self.tx, id, status).await?)
    }

    async fn delete_interest(&mut self, id: DbId) -> StoreResult<bool> {
        Ok(InterestRepo::delete(&mut self.tx, id).await?)
    }

    async fn list_interests_for_job(&mut self, job_id: DbId) -> StoreResult<Vec<Interest>> {
        Ok(InterestRepo::list_for_job(&mut self.tx, job_id).await?)
    }

    async fn list_interests_for_professional(
        &mut self,
        professional_id: DbId,
    ) -> StoreResult<Vec<Interest>> {
        Ok(InterestRepo::list_for_professional(&mut self.tx, professional_id).await?)
    }

    // ---- Notifications -----------------------------------------------------

    async fn create_notification(
        &mut self,
        input: &CreateNotification,
    ) -> StoreResult<Notification> {
        Ok(NotificationRepo::create(&mut self.tx, input).await?)
    }

    async fn find_notification(&mut self, id: DbId) -> StoreResult<Option<Notification>> {
        Ok(NotificationRepo::find_by_id(&mut self.tx, id).await?)
    }

    async fn list_notifications(
        &mut self,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Notification>> {
        Ok(NotificationRepo::list_for_user(&mut self.tx, user_id, unread_only, limit, offset).await?)
    }

    async fn count_unread_notifications(&mut self, user_id: DbId) -> StoreResult<i64> {
        Ok(NotificationRepo::count_unread(&mut self.tx, user_id).await?)
    }

    async fn mark_notification_read(&mut self, id: DbId) -> StoreResult<bool> {
        Ok(NotificationRepo::mark_read(&mut self.tx, id).await?)
    }

    async fn mark_all_notifications_read(&mut self, user_id: DbId) -> StoreResult<u64> {
        Ok(NotificationRepo::mark_all_read(&mut self.tx, user_id).await?)
    }

    async fn delete_notification(&mut self, id: DbId) -> StoreResult<bool> {
        Ok(NotificationRepo::delete(&mut self.tx, id).await?)
    }

    async fn delete_notifications_for_user(
        &mut self,
        user_id: DbId,
        ids: Option<&[DbId]>,
    ) -> StoreResult<u64> {
        Ok(NotificationRepo::delete_for_user(&mut self.tx, user_id, ids).await?)
    }

    // ---- Payments ----------------------------------------------------------

    async fn create_payment(&mut self, input: &CreatePayment) -> StoreResult<Payment> {
        Ok(PaymentRepo::create(&mut self.tx, input).await?)
    }

    async fn find_payment(&mut self, id: DbId) -> StoreResult<Option<Payment>> {
        Ok(PaymentRepo::find_by_id(&mut self.tx, id).await?)
    }

    async fn lock_payment(&mut self, id: DbId) -> StoreResult<Option<Payment>> {
        Ok(PaymentRepo::find_for_update(&mut self.tx, id).await?)
    }

    async fn lock_payment_by_tracking_id(
        &mut self,
        tracking_id: &str,
    ) -> StoreResult<Option<Payment>> {
        Ok(PaymentRepo::find_by_tracking_id_for_update(&mut self.tx, tracking_id).await?)
    }

    async fn list_payments_for_job(&mut self, job_id: DbId) -> StoreResult<Vec<Payment>> {
        Ok(PaymentRepo::list_for_job(&mut self.tx, job_id).await?)
    }

    async fn list_payments_for_institution(
        &mut self,
        institution_id: DbId,
    ) -> StoreResult<Vec<Payment>> {
        Ok(PaymentRepo::list_for_institution(&mut self.tx, institution_id).await?)
    }

    async fn list_payments_for_professional(
        &mut self,
        professional_id: DbId,
    ) -> StoreResult<Vec<Payment>> {
        Ok(PaymentRepo::list_for_professional(&mut self.tx, professional_id).await?)
    }

    async fn set_payment_order(
        &mut self,
        id: DbId,
        tracking_id: &str,
        redirect_url: Option<&str>,
    ) -> StoreResult<Payment> {
        Ok(PaymentRepo::set_order(&mut self.tx, id, tracking_id, redirect_url).await?)
    }

    async fn settle_payment(
        &mut self,
        id: DbId,
        settlement: &PaymentSettlement,
    ) -> StoreResult<Payment> {
        Ok(PaymentRepo::settle(&mut self.tx, id, settlement).await?)
    }

    // ---- Ratings -----------------------------------------------------------

    async fn create_rating(&mut self, input: &CreateRating) -> StoreResult<Rating> {
        Ok(RatingRepo::create(&mut self.tx, input).await?)
    }

    async fn find_rating_by_rater(
        &mut self,
        job_id: DbId,
        rater_user_id: DbId,
    ) -> StoreResult<Option<Rating>> {
        Ok(RatingRepo::find_by_rater(&mut self.tx, job_id, rater_user_id).await?)
    }

    async fn list_ratings_for_user(&mut self, rated_user_id: DbId) -> StoreResult<Vec<Rating>> {
        Ok(RatingRepo::list_for_rated_user(&mut self.tx, rated_user_id).await?)
    }

    // ---- Messages ----------------------------------------------------------

    async fn create_message(&mut self, input: &CreateMessage) -> StoreResult<Message> {
        Ok(MessageRepo::create(&mut self.tx, input).await?)
    }

    async fn find_message(&mut self, id: DbId) -> StoreResult<Option<Message>> {
        Ok(MessageRepo::find_by_id(&mut self.tx, id).await?)
    }

    async fn list_conversation(
        &mut self,
        user_id: DbId,
        other_user_id: DbId,
    ) -> StoreResult<Vec<Message>> {
        Ok(MessageRepo::list_conversation(&mut self.tx, user_id, other_user_id).await?)
    }

    async fn count_unread_messages(&mut self, user_id: DbId) -> StoreResult<i64> {
        Ok(MessageRepo::count_unread(&mut self.tx, user_id).await?)
    }

    async fn mark_message_read(&mut self, id: DbId) -> StoreResult<bool> {
        Ok(MessageRepo::mark_read(&mut self.tx, id).await?)
    }

    async fn hide_message(&mut self, id: DbId, for_sender: bool) -> StoreResult<bool> {
        Ok(MessageRepo::hide(&mut self.tx, id, for_sender).await?)
    }

    // ---- Documents ---------------------------------------------------------

    async fn create_document(&mut self, input: &CreateDocument) -> StoreResult<Document> {
        Ok(DocumentRepo::create(&mut self.tx, input).await?)
    }

    async fn find_document(&mut self, id: DbId) -> StoreResult<Option<Document>> {
        Ok(DocumentRepo::find_by_id(&mut self.tx, id).await?)
    }

    async fn list_documents_for_user(&mut self, user_id: DbId) -> StoreResult<Vec<Document>> {
        Ok(DocumentRepo::list_for_user(&mut self.tx, user_id).await?)
    }

    async fn list_pending_documents(&mut self) -> StoreResult<Vec<Document>> {
        Ok(DocumentRepo::list_pending(&mut self.tx).await?)
    }

    async fn review_document(
        &mut self,
        id: DbId,
        status: DocumentStatus,
        reviewer_id: DbId,
        notes: Option<&str>,
    ) -> StoreResult<Document> {
        Ok(DocumentRepo::review(&mut self.tx, id, status, reviewer_id, notes).await?)
    }
}
