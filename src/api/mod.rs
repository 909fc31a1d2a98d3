// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! REST API implementation using Actix Web.

pub mod ai;
pub mod auth;
pub mod emails;
pub mod errors;
pub mod middleware;
pub mod rest;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use errors::{ApiError, ErrorResponse};
pub use rest::{configure_routes, run_server, AppState};
