/// Backend worker and chat service client
///
/// - `api`: service trait and wire types
/// - `http`: REST implementation of the service trait
/// - `handlers`: per-action tasks and cancellation
/// - `main_loop`: the worker thread's runtime and action loop
pub mod api;
mod handlers;
pub mod http;
mod main_loop;

pub use api::{ChatApi, ModelInfo, SendResponse, SessionSummary};
pub use http::HttpChatApi;
pub use main_loop::run_backend;
