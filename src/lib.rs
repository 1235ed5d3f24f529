//! lifetrack: a client for a personal measurement-tracking API.
//!
//! Templates define named, unit-tagged numeric values; measurements record
//! one timestamped set of values for a template. The crate provides the typed
//! API gateway, the form-state objects behind every screen, the page
//! controller tying them together, and two front ends: a CLI and an embedded
//! web dashboard.

pub mod activity;
pub mod api;
pub mod app;
pub mod browser;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod editor;
pub mod forms;
pub mod model;
pub mod recorder;
pub mod registry;
pub mod session;
pub mod web;
