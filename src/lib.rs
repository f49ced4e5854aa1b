#![allow(clippy::new_without_default)]

pub mod actor;
pub mod common;
pub mod layout_engine;
pub mod model;
pub mod sys;
