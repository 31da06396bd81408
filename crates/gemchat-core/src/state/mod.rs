pub mod model;
pub mod repository;

pub use model::AppSnapshot;
pub use repository::StateRepository;
