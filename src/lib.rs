#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::missing_errors_doc)]

//! Snippetbox
//!
//! A server-rendered pastebin: visitors browse short text snippets, registered
//! users create them. Every request runs through a fixed chain of
//! interceptors (panic recovery, logging, security headers) and page routes
//! add session handling, CSRF protection and identity resolution on top.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

#[cfg(test)]
pub mod test_utils;

pub use domain::entities::*;
