// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod audit;
pub mod dispatch;
pub mod health;
pub mod notifications;
pub mod push;
