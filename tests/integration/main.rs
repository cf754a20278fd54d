//! Router-level tests against the in-memory store and a temporary media root

mod flows;
mod helpers;
mod rest;
