//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument and issue exactly one statement.

pub mod assignment_repo;
pub mod company_repo;
pub mod marker_repo;
pub mod namespace_repo;

pub use assignment_repo::AssignmentRepo;
pub use company_repo::CompanyRepo;
pub use marker_repo::MarkerRepo;
pub use namespace_repo::NamespaceRepo;
