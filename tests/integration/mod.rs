//! Integration tests for the Calcite CLI.

pub mod avatica_test;
pub mod descriptor_test;
pub mod session_test;
pub mod settings_test;
