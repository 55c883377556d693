//! CLI command handlers, one file per command.

mod cancel;
mod catalog_add;
mod checksum;
mod download;
mod editions;
mod list;
mod pause;
mod resume;
mod validate;

pub use cancel::run_cancel;
pub use catalog_add::{run_catalog_add, NewEdition};
pub use checksum::run_checksum;
pub use download::run_download;
pub use editions::run_editions;
pub use list::run_list;
pub use pause::run_pause;
pub use resume::run_resume;
pub use validate::run_validate;
