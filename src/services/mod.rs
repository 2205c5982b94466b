/// Admin service for event management operations.
pub mod admin_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Read-only public event projections.
pub mod public_service;
/// Sliding-window call rate governor.
pub mod rate_limit;
/// Baby shower attendance and gift allocation.
pub mod rsvp_service;
/// Guest session flow over the shared state machine.
pub mod session_service;
/// Storage reconnection supervisor.
pub mod storage_supervisor;
/// Final prediction submission gate.
pub mod submission_service;
