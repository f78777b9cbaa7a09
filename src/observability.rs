use std::net::SocketAddr;

// ── Booking transitions ─────────────────────────────────────────

/// Counter: bookings created.
pub const BOOKINGS_CREATED_TOTAL: &str = "pilatesdesk_bookings_created_total";

/// Counter: reschedules committed.
pub const BOOKINGS_RESCHEDULED_TOTAL: &str = "pilatesdesk_bookings_rescheduled_total";

/// Counter: bookings removed (cascades count every removed booking).
pub const BOOKINGS_DELETED_TOTAL: &str = "pilatesdesk_bookings_deleted_total";

/// Counter: transitions dropped for missing fields or a missing target. Labels: op.
pub const TRANSITIONS_ABORTED_TOTAL: &str = "pilatesdesk_transitions_aborted_total";

/// Counter: equipment allocations created.
pub const ALLOCATIONS_CREATED_TOTAL: &str = "pilatesdesk_allocations_created_total";

// ── Notifications ───────────────────────────────────────────────

/// Counter: simulated messages delivered. Labels: template.
pub const NOTIFICATIONS_SENT_TOTAL: &str = "pilatesdesk_notifications_sent_total";

/// Counter: notifications skipped for lack of a phone number. Labels: template.
pub const NOTIFICATIONS_SKIPPED_TOTAL: &str = "pilatesdesk_notifications_skipped_total";

// ── Persistence ─────────────────────────────────────────────────

/// Histogram: state document write duration in seconds.
pub const SNAPSHOT_WRITE_DURATION_SECONDS: &str = "pilatesdesk_snapshot_write_duration_seconds";

/// Histogram: saves folded into a single write.
pub const SNAPSHOT_COALESCED_SAVES: &str = "pilatesdesk_snapshot_coalesced_saves";

/// Counter: failed state document writes.
pub const SNAPSHOT_WRITE_FAILURES_TOTAL: &str = "pilatesdesk_snapshot_write_failures_total";

/// Gauge: number of loaded tenants.
pub const TENANTS_ACTIVE: &str = "pilatesdesk_tenants_active";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
