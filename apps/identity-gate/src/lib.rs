// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity Gate - Token Verification, Role Guards and Account Provisioning
//!
//! This crate verifies bearer tokens issued by an external identity provider,
//! authorizes them against per-operation role requirements and provisions new
//! provider accounts through the provider's management API.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token verification and role-based authorization
//! - `providers` - Management credential cache, management API client, provisioning
//! - `config` - Environment configuration

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod providers;
pub mod state;

#[cfg(test)]
mod testutil;
