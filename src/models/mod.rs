// ABOUTME: Domain model organization for the AgriLink server
// ABOUTME: Re-exports user, messaging, and diagnosis types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

//! Domain models
//!
//! Identity, conversation/message, and disease/diagnosis entities shared by
//! the storage layer and the HTTP routes.

/// Disease and diagnosis entities
pub mod diagnosis;
/// Conversation and message entities
pub mod messaging;
/// User identity entities
pub mod user;

pub use diagnosis::{Diagnosis, DiagnosisOutcome, Disease};
pub use messaging::{Conversation, ConversationSummary, Message};
pub use user::{NearbyFarmer, ProfileUpdate, PublicProfile, User};
