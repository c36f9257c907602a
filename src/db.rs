pub mod error;
pub mod models;
pub mod observation_repository;
pub mod pool;
pub mod reference_repository;

pub use error::DbError;
pub use models::*;
pub use observation_repository::{ObservationRepository, ProvenanceContext};
pub use pool::DbPool;
pub use reference_repository::ReferenceRepository;
