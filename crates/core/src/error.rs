use crate::lifecycle::JobStatus;
use crate::roles::RoleName;
use crate::types::DbId;

/// Domain error taxonomy shared by every layer above the store.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Lookup by a non-numeric key, e.g. a gateway tracking id.
    #[error("Entity not found: {entity} '{key}'")]
    NotFoundByKey { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(#[from] StateConflict),

    /// Missing or unusable credential.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not permitted to act on the target.
    #[error("Forbidden: {0}")]
    Forbidden(#[from] AccessDenied),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Timed out: {0}")]
    Timeout(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// An operation that is invalid for the current state of an entity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateConflict {
    #[error("Gig is no longer available")]
    JobNotOpen,

    #[error("Interest has already been responded to")]
    InterestNotPending,

    #[error("Gig is already closed")]
    AlreadyClosed,

    #[error("You have already expressed interest in this gig")]
    DuplicateInterest,

    #[error("A completed payment already exists for this gig")]
    DuplicatePayment,

    #[error("Gig in status '{0}' cannot be paid for")]
    JobNotPayable(JobStatus),

    #[error("No professional is assigned to this gig")]
    NoProfessionalAssigned,

    #[error("Cannot move gig from '{from}' to '{to}'")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("You have already rated this gig")]
    DuplicateRating,

    #[error("Gig has payment records and cannot be deleted")]
    JobHasPayments,

    #[error("Gig in status '{0}' cannot be deleted")]
    JobNotDeletable(JobStatus),

    #[error("Document has already been reviewed")]
    DocumentAlreadyReviewed,

    #[error("An account with this email already exists")]
    EmailTaken,
}

impl StateConflict {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::JobNotOpen => "JOB_NOT_OPEN",
            Self::InterestNotPending => "INTEREST_NOT_PENDING",
            Self::AlreadyClosed => "ALREADY_CLOSED",
            Self::DuplicateInterest => "DUPLICATE_INTEREST",
            Self::DuplicatePayment => "DUPLICATE_PAYMENT",
            Self::JobNotPayable(_) => "JOB_NOT_PAYABLE",
            Self::NoProfessionalAssigned => "NO_PROFESSIONAL_ASSIGNED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::DuplicateRating => "DUPLICATE_RATING",
            Self::JobHasPayments => "JOB_HAS_PAYMENTS",
            Self::JobNotDeletable(_) => "JOB_NOT_DELETABLE",
            Self::DocumentAlreadyReviewed => "DOCUMENT_ALREADY_REVIEWED",
            Self::EmailTaken => "EMAIL_TAKEN",
        }
    }
}

/// Why an authenticated caller was denied.
///
/// A missing active role and an active role without a persisted assignment
/// both deny access, but are reported as different kinds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("No active role could be resolved for this session")]
    NoActiveRole,

    #[error("Role '{0}' is not assigned to this user")]
    RoleNotAssigned(RoleName),

    #[error("Role '{0}' cannot be switched to")]
    NonSwitchableRole(RoleName),

    #[error("Active role '{active}' is not permitted to perform this action")]
    RoleNotPermitted { active: RoleName },

    #[error("{0} does not belong to the caller")]
    NotOwner(&'static str),

    #[error("Account is deactivated")]
    AccountDisabled,
}

impl AccessDenied {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoActiveRole => "NO_ACTIVE_ROLE",
            Self::RoleNotAssigned(_) => "ROLE_NOT_ASSIGNED",
            Self::NonSwitchableRole(_) => "NON_SWITCHABLE_ROLE",
            Self::RoleNotPermitted { .. } => "ROLE_NOT_PERMITTED",
            Self::NotOwner(_) => "NOT_OWNER",
            Self::AccountDisabled => "ACCOUNT_DISABLED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_converts_into_core_error() {
        let err: CoreError = StateConflict::DuplicateInterest.into();
        assert!(matches!(
            err,
            CoreError::Conflict(StateConflict::DuplicateInterest)
        ));
    }

    #[test]
    fn access_denied_converts_into_core_error() {
        let err: CoreError = AccessDenied::NoActiveRole.into();
        assert!(matches!(err, CoreError::Forbidden(AccessDenied::NoActiveRole)));
    }

    #[test]
    fn missing_role_and_unassigned_role_have_distinct_codes() {
        assert_ne!(
            AccessDenied::NoActiveRole.code(),
            AccessDenied::RoleNotAssigned(RoleName::Institution).code()
        );
    }

    #[test]
    fn invalid_transition_message_names_both_states() {
        let err = StateConflict::InvalidTransition {
            from: JobStatus::Completed,
            to: JobStatus::Open,
        };
        assert_eq!(err.to_string(), "Cannot move gig from 'completed' to 'open'");
        assert_eq!(err.code(), "INVALID_TRANSITION");
    }

    #[test]
    fn not_found_message_includes_entity_and_id() {
        let err = CoreError::NotFound {
            entity: "Job",
            id: 7,
        };
        assert_eq!(err.to_string(), "Entity not found: Job with id 7");
    }
}
