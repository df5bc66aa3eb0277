// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits for the seams of the Bayan pipeline.

pub mod adapter;
pub mod provider;
pub mod warehouse;

pub use adapter::PluginAdapter;
pub use provider::ProviderAdapter;
pub use warehouse::WarehouseAdapter;
