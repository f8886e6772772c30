//! Domain logic shared by the handlers

pub mod analysis;
pub mod chat;
pub mod email;
pub mod groups;
pub mod plans;
pub mod slug;
