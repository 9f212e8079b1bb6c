//! Host-side pieces of the enviro station: the HTTP file browser, the
//! simulated sensor backend and command-line handling.

pub mod cli;
pub mod http;
pub mod simulated;
