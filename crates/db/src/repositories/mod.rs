//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&mut PgConnection` as the first argument, so the same
//! method runs on a pooled connection or inside an open transaction.

pub mod document_repo;
pub mod institution_repo;
pub mod interest_repo;
pub mod job_repo;
pub mod message_repo;
pub mod notification_repo;
pub mod payment_repo;
pub mod professional_repo;
pub mod rating_repo;
pub mod role_repo;
pub mod session_repo;
pub mod user_repo;

pub use document_repo::DocumentRepo;
pub use institution_repo::InstitutionRepo;
pub use interest_repo::InterestRepo;
pub use job_repo::JobRepo;
pub use message_repo::MessageRepo;
pub use notification_repo::NotificationRepo;
pub use payment_repo::PaymentRepo;
pub use professional_repo::ProfessionalRepo;
pub use rating_repo::RatingRepo;
pub use role_repo::RoleRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
