//! Repodrop GitHub - archive downloads for repodrop
//!
//! This crate provides the HTTP implementation of
//! [`repodrop_core::ArchiveFetcher`] used to pull repository ZIP archives
//! from GitHub.

mod client;

pub use client::ArchiveClient;
