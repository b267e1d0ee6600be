// Interface adapters: HTTP surface, wire protocol and in-memory port adapters.

pub mod api_errors;
pub mod caller;
pub mod extractors;
pub mod handlers;
pub mod protocol;
pub mod routes;
pub mod scm;
pub mod state;
