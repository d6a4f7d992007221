//! # CLI Module
//!
//! Command-line helpers for trying out route templates and tables.
//!
//! ## Commands
//!
//! ### `match`
//!
//! Match one path against one template and print the bindings as JSON:
//!
//! ```bash
//! nestrouter match --pattern '/users/:userId/invite' --path /users/42/invite
//! ```
//!
//! ### `routes`
//!
//! Print the effective configuration and the demo route table built from it:
//!
//! ```bash
//! nestrouter routes --config config/config.yaml
//! ```
//!
//! ### `dispatch`
//!
//! Run one request through the demo table and print status and body:
//!
//! ```bash
//! nestrouter dispatch --method POST --uri '/users/42/invite?from=ada'
//! ```
//!
//! Logging is configured with the `NEST_LOG_*` environment variables and
//! goes to stderr, so command output on stdout stays parseable.

mod commands;


pub use commands::{run, run_cli, Cli, Commands};
