//! # lead-gateway
//!
//! Webhook ingestion gateway for payment platforms.
//!
//! Inbound webhook deliveries are decoded, classified into canonical
//! [`domain::Lead`] records (sales and cart abandonments), and persisted in
//! the background to one of two storage backends chosen at startup: a
//! single JSON document on disk or a relational table (PostgreSQL, or an
//! embedded SQLite file as fallback). A small read API serves the most
//! recent leads to a dashboard.
//!
//! ## Architecture
//!
//! ```text
//! Payment platform                Dashboard
//!     │ POST /webhook/{source}        │ GET /api/leads
//!     │                               │
//!     ├── WebhookReceiver (api/)      ├── LeadRepository (service/)
//!     │    decode + classify (domain/)│
//!     │    ack ◄── returned at once   │
//!     │                               │
//!     ├── IngestQueue (service/)      │
//!     │    bounded channel + worker   │
//!     │                               │
//!     └────────► PersistenceGateway (persistence/) ◄─┘
//!                  ├── FileStore
//!                  └── RelationalStore (sqlx)
//! ```
//!
//! Delivery is best-effort: the caller is acknowledged before storage
//! happens, and a lead that fails every retry is counted and optionally
//! dead-lettered, never redelivered.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
