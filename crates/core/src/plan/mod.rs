//! Plan module for turning a merge spreadsheet into a merge plan.
//!
//! The attached spreadsheet lists one target sample per row. Two columns
//! matter: the sample identifier column (`SEQID` by default) and the merge
//! group column (`OtherName` by default), whose cells hold `;`-delimited
//! identifiers of the runs to concatenate into that sample.
//!
//! Normalization keeps only those two columns and renames them to the
//! canonical `Name` / `Merge` headers expected by the merger tool.
//!
//! # Example
//!
//! ```ignore
//! use seqmerge_core::plan::{read_sheet, normalize, flatten_identifiers, write_plan, PlanConfig};
//!
//! let sheet = read_sheet(Path::new("/work/merge.xlsx"))?;
//! let plan = normalize(&sheet, &PlanConfig::default())?;
//! write_plan(Path::new("/work/Merge.xlsx"), &plan)?;
//!
//! let ids = flatten_identifiers(&plan);
//! write_identifier_list(Path::new("/work/list.txt"), &ids)?;
//! ```

mod builder;
mod config;
mod error;
mod io;
mod types;

pub use builder::{flatten_identifiers, normalize};
pub use config::PlanConfig;
pub use error::PlanError;
pub use io::{read_sheet, write_identifier_list, write_plan};
pub use types::{MergePlan, PlanRow, Sheet, MERGE_COLUMN, NAME_COLUMN};
