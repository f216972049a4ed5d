//! `tg clean`: remove everything ninja built

use crate::config::Config;
use anyhow::Result;

pub fn run(config: &Config) -> Result<i32> {
    let tg_path = config.tg_path()?;
    super::run_ninja(&config.ninja, &tg_path, &["-t", "clean"])
}
