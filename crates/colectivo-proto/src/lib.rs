//! Shared model and logic for the collective's interactive widgets: the
//! canned-response chat and the internet-radio station controller.

pub mod catalog;
pub mod chat;
pub mod config;
pub mod links;
pub mod platform;
pub mod protocol;
pub mod rules;
pub mod station;
