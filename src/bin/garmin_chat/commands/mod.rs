// ABOUTME: Re-exports command modules for garmin-chat
// ABOUTME: Chat and login commands, catalog and settings commands
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub mod chat;
pub mod setup;
