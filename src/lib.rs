#![deny(clippy::all)]
#![warn(missing_docs, nonstandard_style, rust_2018_idioms)]

//! The `/tickets` Lambda function. It binds the DynamoDB table named by
//! `TABLE_NAME` at startup and answers every invocation with a fixed
//! API Gateway proxy response.
pub use crate::{
    config::{InitError, TicketsConfig},
    handler::{init, Tickets, GREETING},
    response::ApiGatewayResponse,
    table::TicketsTable,
};

mod config;
mod handler;
mod response;
mod table;
