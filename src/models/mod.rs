// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod auth;
pub mod movie;
pub mod page;
pub mod review;
pub mod search;
pub mod version;
