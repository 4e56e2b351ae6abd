//! Bank Ledger CLI
//!
//! Command-line interface over a persisted personal banking ledger.
//!
//! # Usage
//!
//! ```bash
//! bank-ledger accounts
//! bank-ledger transactions --account 1
//! bank-ledger transfer 1 2 300 RUB
//! bank-ledger exchange 1 3 1000 0.011
//! bank-ledger --data-dir ./data --write-behind batch operations.csv
//! bank-ledger reset
//! ```
//!
//! Tables are written to stdout as CSV; logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Rejected operation or fatal error (storage unavailable, script not readable)

use bank_ledger_store::{cli, logging};
use std::process;

fn main() {
    let args = cli::parse_args();
    logging::init_tracing(&args.log_level);

    let mut output = std::io::stdout();
    if let Err(e) = cli::run(&args, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
