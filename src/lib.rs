//! Biblio Application Library
//!
//! This library provides the bookstore catalog modules for biblio.

pub mod modules;
