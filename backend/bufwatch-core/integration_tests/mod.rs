mod bridge_tests;
mod companion;
mod config;
mod error;
