//! Command-line interface
//!
//! Command handlers for the `multisig-gate` binary.

pub mod commands;

pub use commands::{
    cmd_approve, cmd_balance, cmd_deposit, cmd_events, cmd_execute, cmd_init, cmd_keygen,
    cmd_list, cmd_owners, cmd_show, cmd_submit, parse_payload, resolve_caller, AppState,
    CliResult, EVENTS_FILE,
};
