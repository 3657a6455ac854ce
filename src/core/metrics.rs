// src/core/metrics.rs

//! Defines and registers Prometheus metrics for server monitoring.
//!
//! This module uses `lazy_static` to ensure that metrics are registered only once
//! globally for the entire application lifecycle.

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, Histogram, TextEncoder, register_counter, register_counter_vec,
    register_gauge, register_histogram,
};

lazy_static! {
    // --- Server-wide Gauges ---
    /// The number of clients currently connected to the server.
    pub static ref CONNECTED_CLIENTS: Gauge =
        register_gauge!("remoteplay_connected_clients", "Number of currently connected clients.").unwrap();
    /// The number of connections holding an authenticated session.
    pub static ref AUTHENTICATED_SESSIONS: Gauge =
        register_gauge!("remoteplay_authenticated_sessions", "Number of authenticated sessions.").unwrap();

    // --- Server-wide Counters ---
    /// The total number of connections accepted by the server since startup.
    pub static ref CONNECTIONS_RECEIVED_TOTAL: Counter =
        register_counter!("remoteplay_connections_received_total", "Total number of connections received.").unwrap();
    /// Commands dispatched, labeled by keyword.
    pub static ref COMMANDS_PROCESSED_TOTAL: CounterVec =
        register_counter_vec!("remoteplay_commands_processed_total", "Total number of commands processed.", &["command"]).unwrap();
    /// Lines that did not parse as any known command.
    pub static ref INVALID_COMMANDS_TOTAL: Counter =
        register_counter!("remoteplay_invalid_commands_total", "Total number of unrecognized command lines.").unwrap();
    /// Commands refused by the permission gate, labeled by keyword.
    pub static ref DENIED_COMMANDS_TOTAL: CounterVec =
        register_counter_vec!("remoteplay_denied_commands_total", "Total number of commands denied by the permission gate.", &["command"]).unwrap();

    // --- Histograms ---
    /// Time spent inside the dispatch lock, including waiting for it.
    pub static ref COMMAND_LATENCY_SECONDS: Histogram =
        register_histogram!("remoteplay_command_latency_seconds", "Latency of command processing in seconds.").unwrap();
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode_to_string(&metric_families).unwrap_or_default()
}
