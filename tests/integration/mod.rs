//! Integration test suite for fleetcron.
//!
//! These tests simulate a fleet of worker processes sharing one in-memory
//! store and one in-memory queue, and exercise the coordination protocol
//! end to end: leader convergence, failover, the accepted dual-leadership
//! race window, and the dispatch-to-consumption path.
//!
//! # Test Categories
//!
//! - `leader_election`: convergence, cooldown hysteresis, failover, races
//! - `queue_flow`: dispatch gating, expiry discards, end-to-end execution
//!
//! # CI Compatibility
//!
//! Everything runs against in-process fakes with short cadences; no
//! external store or queue service is needed.


mod queue_flow;
