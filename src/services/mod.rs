pub mod auth;
pub mod backend;
pub mod drafts;
pub mod exports;
