// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer token verification and role-based authorization.
//!
//! ## Auth Flow
//!
//! 1. Client authenticates with the identity provider
//! 2. Client sends `Authorization: Bearer <JWT>`
//! 3. Service:
//!    - Resolves the signing key by `kid` from the cached JWKS
//!    - Verifies signature, algorithm, expiry, issuer, audience
//!    - Looks up the operation's role requirement and checks the roles claim
//!
//! ## Security
//!
//! - Exactly one configured asymmetric algorithm is accepted
//! - JWKS fetches are rate limited; a stale key set is never served
//! - Operations without a declared requirement are denied

pub mod claims;
pub mod error;
pub mod extractor;
pub mod guard;
pub mod jwks;
pub mod policy;
pub mod roles;
pub mod verifier;

pub use claims::ClaimSet;
pub use error::{AuthError, AuthErrorCategory, KeyFetchError};
pub use extractor::{Auth, Guarded, Operation};
pub use guard::authorize;
pub use jwks::KeyResolver;
pub use policy::OperationPolicy;
pub use roles::{Role, RoleRequirement};
pub use verifier::{extract_bearer, TokenVerifier};
