// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Live notification channel.

mod handler;

pub use handler::{__path_ws_upgrade_handler, ws_upgrade_handler};
