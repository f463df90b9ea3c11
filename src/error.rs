use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Failed to read config file '{path}'")]
    ReadConfig {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file")]
    Config(#[from] toml::de::Error),
    #[error("'{field}' must be a finite, non-negative number of seconds (got {value})")]
    InvalidDuration { field: &'static str, value: f64 },
}
