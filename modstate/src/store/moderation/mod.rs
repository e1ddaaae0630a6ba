mod base;
mod dry_run;

pub use base::*;
pub use dry_run::*;
