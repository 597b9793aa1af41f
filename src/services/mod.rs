// src/services/mod.rs

pub mod access;
pub mod accounts;
pub mod attempts;
pub mod catalog;
pub mod grading;
