//! opora-checker - watches the Opora Country Living booking engine for rooms
//! under a price ceiling and emails an HTML summary.

pub mod config;
pub mod error;
pub mod mailer;
pub mod models;
pub mod monitor;
pub mod report;
pub mod scrapers;
