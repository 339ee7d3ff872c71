mod bridge;
mod ipc;
