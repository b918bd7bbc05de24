use crate::{ApiGatewayResponse, InitError, TicketsConfig, TicketsTable};
use aws_config::BehaviorVersion;
use lambda::{Error, EventClient, LambdaCtx, Runtime};
use serde::de::IgnoredAny;
use tracing::{debug, info};

/// The message every invocation answers with.
pub const GREETING: &str = "Hello from Lambda /tickets!";

/// State shared by every invocation of the function.
#[derive(Debug, Clone)]
pub struct Tickets {
    table: TicketsTable,
}

impl Tickets {
    /// Wraps an already bound table.
    pub fn new(table: TicketsTable) -> Self {
        Self { table }
    }

    /// Initializes the function from the environment: reads `TABLE_NAME`,
    /// loads the default AWS configuration chain and binds the table.
    pub async fn from_env() -> Result<Self, InitError> {
        Self::from_config(TicketsConfig::from_env()?).await
    }

    /// Loads the default AWS configuration chain and binds the configured table.
    pub async fn from_config(config: TicketsConfig) -> Result<Self, InitError> {
        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let table = TicketsTable::new(&sdk_config, config.table_name);
        info!(table = table.name(), "bound tickets table");
        Ok(Self::new(table))
    }

    /// The bound table.
    pub fn table(&self) -> &TicketsTable {
        &self.table
    }

    /// Answers an invocation. The event is accepted in any shape and never
    /// inspected.
    pub async fn handle(&self, _event: IgnoredAny, ctx: LambdaCtx) -> Result<ApiGatewayResponse, Error> {
        debug!(request_id = %ctx.request_id, table = self.table.name(), "tickets invocation");
        Ok(ApiGatewayResponse::json(200, GREETING)?)
    }
}

/// Initializes the function from `vars`. On failure the error is reported to
/// the Runtime API's init error endpoint and returned, and no event is polled.
pub async fn init<C, I>(runtime: &Runtime<C>, vars: I) -> Result<Tickets, Error>
where
    C: EventClient,
    I: IntoIterator<Item = (String, String)>,
{
    let tickets = match TicketsConfig::from_vars(vars) {
        Ok(config) => Tickets::from_config(config).await,
        Err(err) => Err(err),
    };
    match tickets {
        Ok(tickets) => Ok(tickets),
        Err(err) => {
            let err = Error::from(err);
            runtime.init_error(&err).await?;
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::offline_table;

    #[tokio::test]
    async fn fixed_response() {
        let tickets = Tickets::new(offline_table("tickets"));
        let res = tickets.handle(IgnoredAny, LambdaCtx::default()).await.unwrap();
        assert_eq!(res.status_code, 200);
        assert_eq!(res.body, "\"Hello from Lambda /tickets!\"");
    }

    #[tokio::test]
    async fn repeated_calls_agree() {
        let tickets = Tickets::new(offline_table("tickets"));
        let first = tickets.handle(IgnoredAny, LambdaCtx::default()).await.unwrap();
        for id in ["a", "b", "c"] {
            let ctx = LambdaCtx {
                request_id: id.to_owned(),
                ..LambdaCtx::default()
            };
            assert_eq!(tickets.handle(IgnoredAny, ctx).await.unwrap(), first);
        }
    }
}
