mod r#match;
mod rank;

pub use r#match::*;
pub use rank::*;

use crate::config::Opts;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> anyhow::Result<()>;
}
