// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for Workpulse.
//!
//! Routes `POST /webhooks/{platform}` to the registered adapter and serves
//! unauthenticated `GET /health` and `GET /metrics` endpoints.

pub mod handlers;
pub mod server;

pub use server::{GatewayState, HealthState, ServerConfig, build_router, start_server};
