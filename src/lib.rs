//! MedGuid catalog service.
//!
//! Serves the year → semester/unit → module → lesson/exam catalog as nested
//! JSON, with a single shared admin login guarding the editing endpoints.
//! The [`client`] and [`admin`] modules are the consuming side: a typed HTTP
//! client and the optimistic admin state container built on it.

pub mod admin;
pub mod api;
pub mod auth;
pub mod catalog;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
