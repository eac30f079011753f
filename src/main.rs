//! # content-dedup CLI
//!
//! Command-line interface for the content deduplication engine.
//!
//! ## Usage
//! ```bash
//! content-dedup exact ~/Downloads
//! content-dedup scan ~/Archive --verbose --output json
//! ```

mod cli;

use content_dedup::Result;

fn main() -> Result<()> {
    cli::run()
}
