// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Domain layer: pure data types and validation helpers shared between UI and server logic.

pub mod builtin;
pub mod document;
pub mod metadata;
pub mod mode;
pub mod operations;
