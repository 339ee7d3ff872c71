mod bridge;
mod connection;
mod helpers;
