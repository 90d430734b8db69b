pub mod visit_repo;
pub use visit_repo::VisitRepository;
