// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Reusable egui components structured for MVU-style updates.

pub mod connection;
pub mod documents;
pub mod manage_modal;
pub mod value_editor;
