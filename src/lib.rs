pub mod commands;
pub mod config;
pub mod identifier;
pub mod metadata;
pub mod pkginfo;
pub mod report;
pub mod runtime;
pub mod selection;
pub mod upload;
