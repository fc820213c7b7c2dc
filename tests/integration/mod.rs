//! Integration tests for the svncache status cache and its coordinator

mod cli_contracts;
mod gating;
mod ignore_list;
mod initial_load;
mod operations;
mod refresh_convergence;
mod rename;
mod support;
