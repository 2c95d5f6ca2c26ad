//! Convert command implementation.

use anyhow::Result;
use tracing::error;

use crate::range::range_to_cidrs;

/// Run the convert command: one CIDR block per line, ranges in input order
pub fn run(ranges: &[String]) -> Result<()> {
    let mut failed = 0;

    for range in ranges {
        match range_to_cidrs(range) {
            Ok(blocks) => {
                for block in blocks {
                    println!("{}", block);
                }
            }
            Err(e) => {
                error!("{}", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} ranges could not be converted", failed, ranges.len());
    }
    Ok(())
}
