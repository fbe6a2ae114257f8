//! File inputs for the CLI.
//!
//! Price tables, holdings and pipeline configuration are read from disk
//! here and handed to the library as in-memory values.

pub(crate) mod loader;
