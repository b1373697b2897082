pub mod config_service;
pub mod paths;
pub mod secret_service;

pub use crate::config_service::ConfigService;
pub use crate::paths::WebyPaths;
pub use crate::secret_service::SecretServiceImpl;
