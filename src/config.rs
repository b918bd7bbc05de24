use serde::Deserialize;

/// Fatal problems found while initializing the function.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// `TABLE_NAME` is not set in the environment.
    #[error("TABLE_NAME is not set")]
    MissingTableName,
    /// The environment could not be read into [`TicketsConfig`].
    #[error("invalid environment: {0}")]
    Env(#[source] envy::Error),
}

impl From<envy::Error> for InitError {
    fn from(err: envy::Error) -> Self {
        match err {
            envy::Error::MissingValue(field) if field == "table_name" => InitError::MissingTableName,
            other => InitError::Env(other),
        }
    }
}

/// Function configuration read from environment variables.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TicketsConfig {
    /// The DynamoDB table backing the tickets route, from `TABLE_NAME`.
    pub table_name: String,
}

impl TicketsConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, InitError> {
        Ok(envy::from_env::<TicketsConfig>()?)
    }

    /// Reads configuration from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self, InitError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter::<_, TicketsConfig>(vars)?)
    }
}
