// crates/agent-conformance/src/config/mod.rs
// ============================================================================
// Module: Harness Configuration
// Description: Centralized configuration for the conformance harness.
// Purpose: Provide typed access to endpoint URLs, timeouts, and wait policy.
// Dependencies: url
// ============================================================================

//! ## Overview
//! Harness configuration is read from environment variables and mapped into a
//! small typed structure shared by the library, the CLI, and the system-tests.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod env;

// ============================================================================
// SECTION: Tests
// ============================================================================


// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use env::DEFAULT_A2A_URL;
pub use env::DEFAULT_API_URL;
pub use env::DEFAULT_CONVERGENCE_WINDOW;
pub use env::DEFAULT_HEALTH_TIMEOUT;
pub use env::DEFAULT_MCP_URL;
pub use env::DEFAULT_POLL_INTERVAL;
pub use env::DEFAULT_REQUEST_TIMEOUT;
pub use env::HarnessConfig;
pub use env::HarnessEnv;
pub use env::parse_base_url;
pub use env::read_env_strict;
