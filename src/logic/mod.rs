// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Server-facing logic: payload transcoding, the query cache, and the HTTP backend.

pub mod cache;
pub mod client;
pub mod transcode;
