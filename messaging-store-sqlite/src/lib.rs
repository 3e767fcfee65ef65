// Copyright (c) 2026 Michael Campbell. All rights reserved.
// messaging-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Message Store
// Description: Durable Store backend using SQLite WAL.
// Purpose: Provide production-grade persistence for the messaging platform.
// Dependencies: messaging-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a `SQLite`-backed [`Store`](messaging_core::Store)
//! implementation: one connection per process, guarded by a mutex, with
//! every multi-row write wrapped in a `BEGIN IMMEDIATE` transaction. It is
//! the reference durable backend for the in-memory `Store` defined in
//! `messaging-core`; the two pass the exact same contract tests.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
