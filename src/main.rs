use lambda::{handler_fn, Error, Runtime};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda::logging::init_default_subscriber();

    let runtime = Runtime::from_env()?;
    let tickets = tickets::init(&runtime, env::vars()).await?;

    let tickets = &tickets;
    runtime
        .run(handler_fn(move |event, ctx| tickets.handle(event, ctx)))
        .await
}
