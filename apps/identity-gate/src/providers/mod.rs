// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity provider administration: the management credential, the
//! management API client and account provisioning on top of it.

pub mod credential;
pub mod error;
pub mod management;
pub mod provisioning;

pub use credential::ManagementTokenCache;
pub use error::ManagementError;
pub use management::{ManagementClient, ProvisionedAccount, RemoteRole};
pub use provisioning::{ProvisioningError, ProvisioningStep, ProvisioningWorkflow};
