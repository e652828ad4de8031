// Configuration loading

pub mod credentials;
pub mod error;
pub mod settings;

pub use credentials::{get_api_key, load_dotenv, real_inputs_from_env, KeyLookup, KeySource, RealInputs};
pub use error::ConfigError;
pub use settings::{DatasetFile, Endpoints, Settings};
