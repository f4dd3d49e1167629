//! Supporting utilities for the core

pub mod search;
