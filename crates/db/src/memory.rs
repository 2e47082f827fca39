//! In-process [`Store`] with the same constraints as the PostgreSQL schema.
//!
//! A transaction takes the store-wide lock, works on a copy of the state and
//! writes it back on commit. Dropping an uncommitted transaction discards the
//! copy. Transactions are therefore fully serialized, which is stronger than
//! the row locks the PostgreSQL store takes.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use qgig_core::documents::DocumentStatus;
use qgig_core::lifecycle::{InterestStatus, JobStatus};
use qgig_core::messages::{STATUS_READ, STATUS_SENT};
use qgig_core::payments::PaymentStatus;
use qgig_core::roles::RoleName;
use qgig_core::types::{DbId, Timestamp};
use tokio::sync::{Mutex, OwnedMutexGuard};

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
use crate::store::{constraints, Store, StoreError, StoreResult, StoreTx};

const INTERESTS_JOB_FK: &str = "interests_job_id_fkey";
const INTERESTS_PROFESSIONAL_FK: &str = "interests_professional_id_fkey";
const JOBS_INSTITUTION_FK: &str = "jobs_institution_id_fkey";

#[derive(Debug, Clone, Default)]
struct MemoryState {
    next_id: DbId,
    users: BTreeMap<DbId, User>,
    roles: BTreeMap<DbId, Role>,
    user_roles: Vec<(DbId, RoleName)>,
    role_switches: BTreeMap<DbId, RoleSwitchAudit>,
    sessions: BTreeMap<DbId, UserSession>,
    professionals: BTreeMap<DbId, Professional>,
    institutions: BTreeMap<DbId, Institution>,
    jobs: BTreeMap<DbId, Job>,
    interests: BTreeMap<DbId, Interest>,
    notifications: BTreeMap<DbId, Notification>,
    payments: BTreeMap<DbId, Payment>,
    ratings: BTreeMap<DbId, Rating>,
    messages: BTreeMap<DbId, Message>,
    documents: BTreeMap<DbId, Document>,
}

impl MemoryState {
    fn seeded() -> Self {
        let mut state = Self::default();
        let now = Utc::now();
        for (name, is_switchable) in [
            (RoleName::Professional, true),
            (RoleName::Institution, true),
            (RoleName::Admin, false),
        ] {
            let id = state.next_id();
            state.roles.insert(
                id,
                Role {
                    id,
                    name,
                    is_switchable,
                    created_at: now,
                    updated_at: now,
                },
            );
        }
        state
    }

    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

fn unique(constraint: &str) -> StoreError {
    StoreError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

fn foreign_key(constraint: &str) -> StoreError {
    StoreError::ForeignKeyViolation {
        constraint: constraint.to_string(),
    }
}

/// Newest first, ties broken by id.
fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (Timestamp, DbId)) {
    rows.sort_by_key(|row| std::cmp::Reverse(key(row)));
}

/// Cloneable handle to shared in-memory state.
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Empty store with the role lookup rows seeded.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::seeded())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx { guard, work }))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Serialized unit of work over a private copy of the state.
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    work: MemoryState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTx { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }

    // ---- Users -------------------------------------------------------------

    async fn create_user(&mut self, input: &CreateUser) -> StoreResult<User> {
        let email = input.email.to_lowercase();
        if self.work.users.values().any(|u| u.email == email) {
            return Err(unique(constraints::USERS_EMAIL));
        }
        let id = self.work.next_id();
        let now = Utc::now();
        let user = User {
            id,
            email,
            username: input.username.clone(),
            password_hash: input.password_hash.clone(),
            role: input.role,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        self.work.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_user(&mut self, id: DbId) -> StoreResult<Option<User>> {
        Ok(self.work.users.get(&id).cloned())
    }

    async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
        let email = email.to_lowercase();
        Ok(self.work.users.values().find(|u| u.email == email).cloned())
    }

    async fn record_login(&mut self, user_id: DbId) -> StoreResult<()> {
        if let Some(user) = self.work.users.get_mut(&user_id) {
            let now = Utc::now();
            user.last_login_at = Some(now);
            user.updated_at = now;
        }
        Ok(())
    }

    async fn set_user_active(&mut self, user_id: DbId, is_active: bool) -> StoreResult<bool> {
        match self.work.users.get_mut(&user_id) {
            Some(user) => {
                user.is_active = is_active;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ---- Roles -------------------------------------------------------------

    async fn find_role(&mut self, name: RoleName) -> StoreResult<Option<Role>> {
        Ok(self.work.roles.values().find(|r| r.name == name).cloned())
    }

    async fn list_user_roles(&mut self, user_id: DbId) -> StoreResult<Vec<RoleName>> {
        let mut roles: Vec<RoleName> = self
            .work
            .user_roles
            .iter()
            .filter(|(uid, _)| *uid == user_id)
            .map(|(_, role)| *role)
            .collect();
        roles.sort();
        Ok(roles)
    }

    async fn assign_role(&mut self, user_id: DbId, role: RoleName) -> StoreResult<bool> {
        if !self.work.users.contains_key(&user_id) {
            return Err(foreign_key("user_roles_user_id_fkey"));
        }
        if self.work.user_roles.contains(&(user_id, role)) {
            return Ok(false);
        }
        self.work.user_roles.push((user_id, role));
        Ok(true)
    }

    async fn record_role_switch(
        &mut self,
        input: &CreateRoleSwitchAudit,
    ) -> StoreResult<RoleSwitchAudit> {
        let id = self.work.next_id();
        let now = Utc::now();
        let entry = RoleSwitchAudit {
            id,
            user_id: input.user_id,
            from_role: input.from_role.map(|r| r.as_str().to_string()),
            to_role: input.to_role.as_str().to_string(),
            ip_address: input.ip_address.clone(),
            user_agent: input.user_agent.clone(),
            created_at: now,
            updated_at: now,
        };
        self.work.role_switches.insert(id, entry.clone());
        Ok(entry)
    }

    async fn list_role_switches(&mut self, user_id: DbId) -> StoreResult<Vec<RoleSwitchAudit>> {
        let mut rows: Vec<_> = self
            .work
            .role_switches
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |a| (a.created_at, a.id));
        Ok(rows)
    }

    // ---- Sessions ----------------------------------------------------------

    async fn create_session(&mut self, input: &CreateSession) -> StoreResult<UserSession> {
        if self
            .work
            .sessions
            .values()
            .any(|s| s.token_hash == input.token_hash)
        {
            return Err(unique(constraints::SESSIONS_TOKEN_HASH));
        }
        let id = self.work.next_id();
        let now = Utc::now();
        let session = UserSession {
            id,
            user_id: input.user_id,
            token_hash: input.token_hash.clone(),
            active_role: input.active_role.map(|r| r.as_str().to_string()),
            expires_at: input.expires_at,
            is_revoked: false,
            user_agent: input.user_agent.clone(),
            ip_address: input.ip_address.clone(),
            created_at: now,
            updated_at: now,
        };
        self.work.sessions.insert(id, session.clone());
        Ok(session)
    }

    async fn find_session(&mut self, id: DbId) -> StoreResult<Option<UserSession>> {
        let now = Utc::now();
        Ok(self
            .work
            .sessions
            .get(&id)
            .filter(|s| !s.is_revoked && s.expires_at > now)
            .cloned())
    }

    async fn find_session_by_token_hash(
        &mut self,
        hash: &str,
    ) -> StoreResult<Option<UserSession>> {
        let now = Utc::now();
        Ok(self
            .work
            .sessions
            .values()
            .find(|s| s.token_hash == hash && !s.is_revoked && s.expires_at > now)
            .cloned())
    }

    async fn set_session_active_role(&mut self, id: DbId, role: RoleName) -> StoreResult<()> {
        if let Some(session) = self.work.sessions.get_mut(&id) {
            session.active_role = Some(role.as_str().to_string());
            session.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn revoke_session(&mut self, id: DbId) -> StoreResult<bool> {
        match self.work.sessions.get_mut(&id) {
            Some(session) if !session.is_revoked => {
                session.is_revoked = true;
                session.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_sessions(&mut self, user_id: DbId) -> StoreResult<u64> {
        let mut count = 0;
        for session in self.work.sessions.values_mut() {
            if session.user_id == user_id && !session.is_revoked {
                session.is_revoked = true;
                count += 1;
            }
        }
        Ok(count)
    }

    // ---- Profiles ----------------------------------------------------------

    async fn create_professional(
        &mut self,
        user_id: DbId,
        full_name: &str,
    ) -> StoreResult<Professional> {
        if self.work.professionals.values().any(|p| p.user_id == user_id) {
            return Err(unique(constraints::PROFESSIONALS_USER));
        }
        let id = self.work.next_id();
        let now = Utc::now();
        let profile = Professional {
            id,
            user_id,
            full_name: full_name.to_string(),
            phone_number: None,
            skills: None,
            bio: None,
            hourly_rate: None,
            location: None,
            created_at: now,
            updated_at: now,
        };
        self.work.professionals.insert(id, profile.clone());
        Ok(profile)
    }

    async fn find_professional(&mut self, id: DbId) -> StoreResult<Option<Professional>> {
        Ok(self.work.professionals.get(&id).cloned())
    }

    async fn find_professional_by_user(
        &mut self,
        user_id: DbId,
    ) -> StoreResult<Option<Professional>> {
        Ok(self
            .work
            .professionals
            .values()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn create_institution(&mut self, user_id: DbId, name: &str) -> StoreResult<Institution> {
        if self.work.institutions.values().any(|i| i.user_id == user_id) {
            return Err(unique(constraints::INSTITUTIONS_USER));
        }
        let id = self.work.next_id();
        let now = Utc::now();
        let profile = Institution {
            id,
            user_id,
            institution_name: name.to_string(),
            description: None,
            contact_email: None,
            contact_phone: None,
            location: None,
            created_at: now,
            updated_at: now,
        };
        self.work.institutions.insert(id, profile.clone());
        Ok(profile)
    }

    async fn find_institution(&mut self, id: DbId) -> StoreResult<Option<Institution>> {
        Ok(self.work.institutions.get(&id).cloned())
    }

    async fn find_institution_by_user(
        &mut self,
        user_id: DbId,
    ) -> StoreResult<Option<Institution>> {
        Ok(self
            .work
            .institutions
            .values()
            .find(|i| i.user_id == user_id)
            .cloned())
    }

    // ---- Jobs --------------------------------------------------------------

    async fn create_job(&mut self, input: &CreateJob) -> StoreResult<Job> {
        if !self.work.institutions.contains_key(&input.institution_id) {
            return Err(foreign_key(JOBS_INSTITUTION_FK));
        }
        let id = self.work.next_id();
        let now = Utc::now();
        let job = Job {
            id,
            institution_id: input.institution_id,
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            location: input.location.trim().to_string(),
            pay_amount: input.pay_amount,
            duration_hours: input.duration_hours,
            is_urgent: input.is_urgent,
            job_type: input.job_type.clone(),
            sector: input.sector.clone(),
            status: JobStatus::Open,
            assigned_professional_id: None,
            start_date: input.start_date,
            expiry_date: input.expiry_date,
            created_at: now,
            updated_at: now,
        };
        self.work.jobs.insert(id, job.clone());
        Ok(job)
    }

    async fn find_job(&mut self, id: DbId) -> StoreResult<Option<Job>> {
        Ok(self.work.jobs.get(&id).cloned())
    }

    async fn lock_job(&mut self, id: DbId) -> StoreResult<Option<Job>> {
        Ok(self.work.jobs.get(&id).cloned())
    }

    async fn update_job_details(&mut self, id: DbId, input: &UpdateJob) -> StoreResult<Job> {
        let job = self.work.jobs.get_mut(&id).ok_or(StoreError::RowNotFound)?;
        if let Some(title) = &input.title {
            job.title = title.trim().to_string();
        }
        if let Some(description) = &input.description {
            job.description = description.trim().to_string();
        }
        if let Some(location) = &input.location {
            job.location = location.trim().to_string();
        }
        if let Some(pay_amount) = input.pay_amount {
            job.pay_amount = pay_amount;
        }
        if input.duration_hours.is_some() {
            job.duration_hours = input.duration_hours;
        }
        if let Some(is_urgent) = input.is_urgent {
            job.is_urgent = is_urgent;
        }
        if input.job_type.is_some() {
            job.job_type = input.job_type.clone();
        }
        if input.sector.is_some() {
            job.sector = input.sector.clone();
        }
        if input.start_date.is_some() {
            job.start_date = input.start_date;
        }
        if input.expiry_date.is_some() {
            job.expiry_date = input.expiry_date;
        }
        job.updated_at = Utc::now();
        Ok(job.clone())
    }

    async fn set_job_status(
        &mut self,
        id: DbId,
        status: JobStatus,
        assigned_professional_id: Option<DbId>,
    ) -> StoreResult<Job> {
        let job = self.work.jobs.get_mut(&id).ok_or(StoreError::RowNotFound)?;
        job.status = status;
        job.assigned_professional_id = assigned_professional_id;
        job.updated_at = Utc::now();
        Ok(job.clone())
    }

    async fn delete_job(&mut self, id: DbId) -> StoreResult<bool> {
        if !self.work.jobs.contains_key(&id) {
            return Ok(false);
        }
        if self.work.payments.values().any(|p| p.job_id == id) {
            return Err(foreign_key(constraints::PAYMENTS_JOB_FK));
        }
        self.work.jobs.remove(&id);

        let removed: Vec<DbId> = self
            .work
            .interests
            .values()
            .filter(|i| i.job_id == id)
            .map(|i| i.id)
            .collect();
        for interest_id in &removed {
            self.work.interests.remove(interest_id);
        }
        for notification in self.work.notifications.values_mut() {
            if notification
                .interest_id
                .is_some_and(|iid| removed.contains(&iid))
            {
                notification.interest_id = None;
            }
        }
        for message in self.work.messages.values_mut() {
            if message.job_id == Some(id) {
                message.job_id = None;
            }
        }
        self.work.ratings.retain(|_, r| r.job_id != id);
        Ok(true)
    }

    async fn list_open_jobs(&mut self, filter: &JobFilter) -> StoreResult<Vec<Job>> {
        let now = Utc::now();
        let needle = filter.location.as_deref().map(str::to_lowercase);
        let mut rows: Vec<Job> = self
            .work
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Open)
            .filter(|j| j.expiry_date.map_or(true, |e| e > now))
            .filter(|j| {
                needle
                    .as_deref()
                    .map_or(true, |n| j.location.to_lowercase().contains(n))
            })
            .filter(|j| !filter.urgent_only || j.is_urgent)
            .cloned()
            .collect();
        rows.sort_by_key(|j| std::cmp::Reverse((j.is_urgent, j.created_at, j.id)));
        Ok(rows
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn list_jobs_for_institution(&mut self, institution_id: DbId) -> StoreResult<Vec<Job>> {
        let mut rows: Vec<Job> = self
            .work
            .jobs
            .values()
            .filter(|j| j.institution_id == institution_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |j| (j.created_at, j.id));
        Ok(rows)
    }

    async fn list_jobs_assigned_to(&mut self, professional_id: DbId) -> StoreResult<Vec<Job>> {
        let mut rows: Vec<Job> = self
            .work
            .jobs
            .values()
            .filter(|j| j.assigned_professional_id == Some(professional_id))
            .cloned()
            .collect();
        newest_first(&mut rows, |j| (j.updated_at, j.id));
        Ok(rows)
    }

    async fn list_expired_open_jobs(&mut self, now: Timestamp) -> StoreResult<Vec<Job>> {
        Ok(self
            .work
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Open && j.expiry_date.is_some_and(|e| e <= now))
            .cloned()
            .collect())
    }

    // ---- Interests ---------------------------------------------------------

    async fn create_interest(
        &mut self,
        job_id: DbId,
        professional_id: DbId,
    ) -> StoreResult<Interest> {
        if !self.work.jobs.contains_key(&job_id) {
            return Err(foreign_key(INTERESTS_JOB_FK));
        }
        if !self.work.professionals.contains_key(&professional_id) {
            return Err(foreign_key(INTERESTS_PROFESSIONAL_FK));
        }
        if self
            .work
            .interests
            .values()
            .any(|i| i.job_id == job_id && i.professional_id == professional_id)
        {
            return Err(unique(constraints::INTERESTS_JOB_PROFESSIONAL));
        }
        let id = self.work.next_id();
        let now = Utc::now();
        let interest = Interest {
            id,
            job_id,
            professional_id,
            status: InterestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.work.interests.insert(id, interest.clone());
        Ok(interest)
    }

    async fn find_interest(&mut self, id: DbId) -> StoreResult<Option<Interest>> {
        Ok(self.work.interests.get(&id).cloned())
    }

    async fn find_interest_for(
        &mut self,
        job_id: DbId,
        professional_id: DbId,
    ) -> StoreResult<Option<Interest>> {
        Ok(self
            .work
            .interests
            .values()
            .find(|i| i.job_id == job_id && i.professional_id == professional_id)
            .cloned())
    }

    async fn set_interest_status(
        &mut self,
        id: DbId,
        status: InterestStatus,
    ) -> StoreResult<Interest> {
        let interest = self
            .work
            .interests
            .get_mut(&id)
            .ok_or(StoreError::RowNotFound)?;
        interest.status = status;
        interest.updated_at = Utc::now();
        Ok(interest.clone())
    }

    async fn delete_interest(&mut self, id: DbId) -> StoreResult<bool> {
        if self.work.interests.remove(&id).is_none() {
            return Ok(false);
        }
        for notification in self.work.notifications.values_mut() {
            if notification.interest_id == Some(id) {
                notification.interest_id = None;
            }
        }
        Ok(true)
    }

    async fn list_interests_for_job(&mut self, job_id: DbId) -> StoreResult<Vec<Interest>> {
        let mut rows: Vec<Interest> = self
            .work
            .interests
            .values()
            .filter(|i| i.job_id == job_id)
            .cloned()
            .collect();
        rows.sort_by_key(|i| (i.created_at, i.id));
        Ok(rows)
    }

    async fn list_interests_for_professional(
        &mut self,
        professional_id: DbId,
    ) -> StoreResult<Vec<Interest>> {
        let mut rows: Vec<Interest> = self
            .work
            .interests
            .values()
            .filter(|i| i.professional_id == professional_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |i| (i.created_at, i.id));
        Ok(rows)
    }

    // ---- Notifications -----------------------------------------------------

    async fn create_notification(
        &mut self,
        input: &CreateNotification,
    ) -> StoreResult<Notification> {
        let id = self.work.next_id();
        let now = Utc::now();
        let notification = Notification {
            id,
            user_id: input.user_id,
            title: input.title.clone(),
            message: input.message.clone(),
            is_read: false,
            read_at: None,
            interest_id: input.interest_id,
            created_at: now,
            updated_at: now,
        };
        self.work.notifications.insert(id, notification.clone());
        Ok(notification)
    }

    async fn find_notification(&mut self, id: DbId) -> StoreResult<Option<Notification>> {
        Ok(self.work.notifications.get(&id).cloned())
    }

    async fn list_notifications(
        &mut self,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Notification>> {
        let mut rows: Vec<Notification> = self
            .work
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        newest_first(&mut rows, |n| (n.created_at, n.id));
        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_unread_notifications(&mut self, user_id: DbId) -> StoreResult<i64> {
        Ok(self
            .work
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_notification_read(&mut self, id: DbId) -> StoreResult<bool> {
        match self.work.notifications.get_mut(&id) {
            Some(notification) => {
                let now = Utc::now();
                notification.is_read = true;
                notification.read_at.get_or_insert(now);
                notification.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_notifications_read(&mut self, user_id: DbId) -> StoreResult<u64> {
        let now = Utc::now();
        let mut count = 0;
        for notification in self.work.notifications.values_mut() {
            if notification.user_id == user_id && !notification.is_read {
                notification.is_read = true;
                notification.read_at = Some(now);
                notification.updated_at = now;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete_notification(&mut self, id: DbId) -> StoreResult<bool> {
        Ok(self.work.notifications.remove(&id).is_some())
    }

    async fn delete_notifications_for_user(
        &mut self,
        user_id: DbId,
        ids: Option<&[DbId]>,
    ) -> StoreResult<u64> {
        let before = self.work.notifications.len();
        self.work.notifications.retain(|id, n| {
            let selected = n.user_id == user_id && ids.map_or(true, |ids| ids.contains(id));
            !selected
        });
        Ok((before - self.work.notifications.len()) as u64)
    }

    // ---- Payments ----------------------------------------------------------

    async fn create_payment(&mut self, input: &CreatePayment) -> StoreResult<Payment> {
        if !self.work.jobs.contains_key(&input.job_id) {
            return Err(foreign_key(constraints::PAYMENTS_JOB_FK));
        }
        if self
            .work
            .payments
            .values()
            .any(|p| p.merchant_reference == input.merchant_reference)
        {
            return Err(unique(constraints::PAYMENTS_MERCHANT_REFERENCE));
        }
        let id = self.work.next_id();
        let now = Utc::now();
        let payment = Payment {
            id,
            job_id: input.job_id,
            institution_id: input.institution_id,
            professional_id: input.professional_id,
            amount: input.amount,
            currency: input.currency.clone(),
            merchant_reference: input.merchant_reference.clone(),
            order_tracking_id: None,
            redirect_url: None,
            transaction_id: None,
            payment_method: None,
            status: PaymentStatus::Pending,
            failure_reason: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.work.payments.insert(id, payment.clone());
        Ok(payment)
    }

    async fn find_payment(&mut self, id: DbId) -> StoreResult<Option<Payment>> {
        Ok(self.work.payments.get(&id).cloned())
    }

    async fn lock_payment(&mut self, id: DbId) -> StoreResult<Option<Payment>> {
        Ok(self.work.payments.get(&id).cloned())
    }

    async fn lock_payment_by_tracking_id(
        &mut self,
        tracking_id: &str,
    ) -> StoreResult<Option<Payment>> {
        Ok(self
            .work
            .payments
            .values()
            .find(|p| p.order_tracking_id.as_deref() == Some(tracking_id))
            .cloned())
    }

    async fn list_payments_for_job(&mut self, job_id: DbId) -> StoreResult<Vec<Payment>> {
        let mut rows: Vec<Payment> = self
            .work
            .payments
            .values()
            .filter(|p| p.job_id == job_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| (p.created_at, p.id));
        Ok(rows)
    }

    async fn list_payments_for_institution(
        &mut self,
        institution_id: DbId,
    ) -> StoreResult<Vec<Payment>> {
        let mut rows: Vec<Payment> = self
            .work
            .payments
            .values()
            .filter(|p| p.institution_id == institution_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |p| (p.created_at, p.id));
        Ok(rows)
    }

    async fn list_payments_for_professional(
        &mut self,
        professional_id: DbId,
    ) -> StoreResult<Vec<Payment>> {
        let mut rows: Vec<Payment> = self
            .work
            .payments
            .values()
            .filter(|p| p.professional_id == professional_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |p| (p.created_at, p.id));
        Ok(rows)
    }

    async fn set_payment_order(
        &mut self,
        id: DbId,
        tracking_id: &str,
        redirect_url: Option<&str>,
    ) -> StoreResult<Payment> {
        if self
            .work
            .payments
            .values()
            .any(|p| p.id != id && p.order_tracking_id.as_deref() == Some(tracking_id))
        {
            return Err(unique(constraints::PAYMENTS_ORDER_TRACKING_ID));
        }
        let payment = self
            .work
            .payments
            .get_mut(&id)
            .ok_or(StoreError::RowNotFound)?;
        payment.order_tracking_id = Some(tracking_id.to_string());
        payment.redirect_url = redirect_url.map(str::to_string);
        payment.updated_at = Utc::now();
        Ok(payment.clone())
    }

    async fn settle_payment(
        &mut self,
        id: DbId,
        settlement: &PaymentSettlement,
    ) -> StoreResult<Payment> {
        let job_id = self
            .work
            .payments
            .get(&id)
            .map(|p| p.job_id)
            .ok_or(StoreError::RowNotFound)?;
        if settlement.status == PaymentStatus::Completed
            && self.work.payments.values().any(|p| {
                p.id != id && p.job_id == job_id && p.status == PaymentStatus::Completed
            })
        {
            return Err(unique(constraints::PAYMENTS_ONE_COMPLETED_PER_JOB));
        }
        let payment = self
            .work
            .payments
            .get_mut(&id)
            .ok_or(StoreError::RowNotFound)?;
        payment.status = settlement.status;
        if settlement.transaction_id.is_some() {
            payment.transaction_id = settlement.transaction_id.clone();
        }
        if settlement.payment_method.is_some() {
            payment.payment_method = settlement.payment_method.clone();
        }
        payment.failure_reason = settlement.failure_reason.clone();
        payment.completed_at = settlement.completed_at;
        payment.updated_at = Utc::now();
        Ok(payment.clone())
    }

    // ---- Ratings -----------------------------------------------------------

    async fn create_rating(&mut self, input: &CreateRating) -> StoreResult<Rating> {
        if self
            .work
            .ratings
            .values()
            .any(|r| r.job_id == input.job_id && r.rater_user_id == input.rater_user_id)
        {
            return Err(unique(constraints::RATINGS_JOB_RATER));
        }
        let id = self.work.next_id();
        let now = Utc::now();
        let rating = Rating {
            id,
            job_id: input.job_id,
            rater_user_id: input.rater_user_id,
            rated_user_id: input.rated_user_id,
            score: input.score,
            feedback: input.feedback.clone(),
            created_at: now,
            updated_at: now,
        };
        self.work.ratings.insert(id, rating.clone());
        Ok(rating)
    }

    async fn find_rating_by_rater(
        &mut self,
        job_id: DbId,
        rater_user_id: DbId,
    ) -> StoreResult<Option<Rating>> {
        Ok(self
            .work
            .ratings
            .values()
            .find(|r| r.job_id == job_id && r.rater_user_id == rater_user_id)
            .cloned())
    }

    async fn list_ratings_for_user(&mut self, rated_user_id: DbId) -> StoreResult<Vec<Rating>> {
        let mut rows: Vec<Rating> = self
            .work
            .ratings
            .values()
            .filter(|r| r.rated_user_id == rated_user_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |r| (r.created_at, r.id));
        Ok(rows)
    }

    // ---- Messages ----------------------------------------------------------

    async fn create_message(&mut self, input: &CreateMessage) -> StoreResult<Message> {
        let id = self.work.next_id();
        let now = Utc::now();
        let message = Message {
            id,
            sender_id: input.sender_id,
            receiver_id: input.receiver_id,
            job_id: input.job_id,
            subject: input.subject.clone(),
            content: input.content.clone(),
            status: STATUS_SENT.to_string(),
            is_read: false,
            read_at: None,
            deleted_by_sender: false,
            deleted_by_receiver: false,
            created_at: now,
            updated_at: now,
        };
        self.work.messages.insert(id, message.clone());
        Ok(message)
    }

    async fn find_message(&mut self, id: DbId) -> StoreResult<Option<Message>> {
        Ok(self.work.messages.get(&id).cloned())
    }

    async fn list_conversation(
        &mut self,
        user_id: DbId,
        other_user_id: DbId,
    ) -> StoreResult<Vec<Message>> {
        let mut rows: Vec<Message> = self
            .work
            .messages
            .values()
            .filter(|m| {
                (m.sender_id == user_id && m.receiver_id == other_user_id && !m.deleted_by_sender)
                    || (m.sender_id == other_user_id
                        && m.receiver_id == user_id
                        && !m.deleted_by_receiver)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|m| (m.created_at, m.id));
        Ok(rows)
    }

    async fn count_unread_messages(&mut self, user_id: DbId) -> StoreResult<i64> {
        Ok(self
            .work
            .messages
            .values()
            .filter(|m| m.receiver_id == user_id && !m.is_read && !m.deleted_by_receiver)
            .count() as i64)
    }

    async fn mark_message_read(&mut self, id: DbId) -> StoreResult<bool> {
        match self.work.messages.get_mut(&id) {
            Some(message) => {
                let now = Utc::now();
                message.is_read = true;
                message.status = STATUS_READ.to_string();
                message.read_at.get_or_insert(now);
                message.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn hide_message(&mut self, id: DbId, for_sender: bool) -> StoreResult<bool> {
        match self.work.messages.get_mut(&id) {
            Some(message) => {
                if for_sender {
                    message.deleted_by_sender = true;
                } else {
                    message.deleted_by_receiver = true;
                }
                message.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ---- Documents ---------------------------------------------------------

    async fn create_document(&mut self, input: &CreateDocument) -> StoreResult<Document> {
        let id = self.work.next_id();
        let now = Utc::now();
        let document = Document {
            id,
            user_id: input.user_id,
            document_type: input.document_type,
            file_path: input.file_path.clone(),
            file_name: input.file_name.clone(),
            file_size: input.file_size,
            mime_type: input.mime_type.clone(),
            status: DocumentStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            admin_notes: None,
            created_at: now,
            updated_at: now,
        };
        self.work.documents.insert(id, document.clone());
        Ok(document)
    }

    async fn find_document(&mut self, id: DbId) -> StoreResult<Option<Document>> {
        Ok(self.work.documents.get(&id).cloned())
    }

    async fn list_documents_for_user(&mut self, user_id: DbId) -> StoreResult<Vec<Document>> {
        let mut rows: Vec<Document> = self
            .work
            .documents
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |d| (d.created_at, d.id));
        Ok(rows)
    }

    async fn list_pending_documents(&mut self) -> StoreResult<Vec<Document>> {
        let mut rows: Vec<Document> = self
            .work
            .documents
            .values()
            .filter(|d| d.status == DocumentStatus::Pending)
            .cloned()
            .collect();
        rows.sort_by_key(|d| (d.created_at, d.id));
        Ok(rows)
    }

    async fn review_document(
        &mut self,
        id: DbId,
        status: DocumentStatus,
        reviewer_id: DbId,
        notes: Option<&str>,
    ) -> StoreResult<Document> {
        let document = self
            .work
            .documents
            .get_mut(&id)
            .ok_or(StoreError::RowNotFound)?;
        let now = Utc::now();
        document.status = status;
        document.reviewed_by = Some(reviewer_id);
        document.reviewed_at = Some(now);
        document.admin_notes = notes.map(str::to_string);
        document.updated_at = now;
        Ok(document.clone())
    }
}
