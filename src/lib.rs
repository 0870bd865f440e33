// src/lib.rs

//! Notice relay library: polls the MapleStory notice listing and forwards new
//! announcements to a Discord webhook.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
