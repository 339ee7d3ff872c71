mod companion;
mod config;
mod ipc;
