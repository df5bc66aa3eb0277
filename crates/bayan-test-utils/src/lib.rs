// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Bayan integration tests.
//!
//! Provides deterministic, scriptable stand-ins for the two external seams:
//! the language model provider and the warehouse.

pub mod mock_provider;
pub mod spy_warehouse;

pub use mock_provider::MockProvider;
pub use spy_warehouse::SpyWarehouse;
