// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod a11y;
pub mod config;
pub mod cursor;
pub mod event;
pub mod gesture;
pub mod prompt;
pub mod screen;
pub mod session;
pub mod test_support;
