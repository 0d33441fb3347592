//! Data loading and collaborators
//!
//! Handles:
//! - Daily trade table parsing (TAIFEX options trade log)
//! - Daily archive extraction and local caching
//! - TAIFEX trading calendar, archive download, settlement price
//! - TWSE index open/close levels
//! - Retry policy around every network call

pub mod archive;
pub mod cache;
pub mod retry;
pub mod source;
pub mod table;
pub mod taifex;
pub mod twse;

pub use archive::{archive_file_name, extract_csv};
pub use cache::*;
pub use retry::*;
pub use source::*;
pub use table::*;
pub use taifex::TaifexClient;
pub use twse::{IndexLevel, TwseClient};
