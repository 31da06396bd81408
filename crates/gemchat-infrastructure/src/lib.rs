//! gemchat-infrastructure: persistence, configuration, paths, image
//! attachments and the remote country list.

pub mod attachment;
pub mod config_service;
pub mod dto;
pub mod paths;
pub mod rest_countries;
pub mod state_repository;
pub mod storage;

pub use attachment::image_data_uri;
pub use config_service::ConfigService;
pub use paths::{GemchatPaths, PathError};
pub use rest_countries::RestCountriesProvider;
pub use state_repository::{InMemoryStateRepository, JsonStateRepository};
pub use storage::{AtomicFile, FileKeyValueStore, StorageError};
