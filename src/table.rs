use aws_config::SdkConfig;
use aws_sdk_dynamodb::Client;
use std::fmt;

/// Handle to the DynamoDB table holding tickets.
///
/// Only the binding is established here; no items are read or written.
#[derive(Clone)]
pub struct TicketsTable {
    // Client wraps an Arc so cloning the handle is cheap
    client: Client,
    name: String,
}

impl TicketsTable {
    /// Binds `name` using an already loaded SDK configuration.
    pub fn new(sdk_config: &SdkConfig, name: impl Into<String>) -> Self {
        Self::from_client(Client::new(sdk_config), name)
    }

    /// Binds `name` using an existing DynamoDB client.
    pub fn from_client(client: Client, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }

    /// The table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The DynamoDB client bound to this table.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl fmt::Debug for TicketsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicketsTable").field("name", &self.name).finish_non_exhaustive()
    }
}
