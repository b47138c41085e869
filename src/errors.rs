use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("CLI_INVALID: {0}")]
    Cli(String),
    #[error("INPUT_INVALID: {0}")]
    Input(String),
    #[error("CONFIG_INVALID: {0}")]
    Config(String),
    #[error("SNAPSHOT_EMPTY: {0}")]
    EmptySnapshot(String),
    #[error("IO_FAILURE: {0}")]
    Io(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl AppError {
    pub fn missing_headers(missing: &[&str]) -> Self {
        Self::Input(format!("Missing required headers: {}", missing.join(", ")))
    }

    pub fn invalid_week_ending(raw: &str) -> Self {
        Self::Input(format!(
            "week_ending must be a date like YYYY-MM-DD (got {:?})",
            raw
        ))
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Input(value.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Config(value.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn missing_headers_names_every_column() {
        let error = AppError::missing_headers(&["Status", "Parent key"]);
        assert_eq!(
            error.to_string(),
            "INPUT_INVALID: Missing required headers: Status, Parent key"
        );
    }

    #[test]
    fn week_ending_error_quotes_raw_value() {
        let error = AppError::invalid_week_ending("next friday");
        assert!(error.to_string().contains("\"next friday\""));
    }
}
