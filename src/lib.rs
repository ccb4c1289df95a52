#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod convert;
pub mod dates;
pub mod detail;
pub mod formats;
pub mod html;
pub mod listing;
pub mod logging;
pub mod markdown;
pub mod place;
pub mod sections;
pub mod serve;
pub mod site;
pub mod source;
