use std::path::PathBuf;
use std::process;

use vn_sim::run_wrapper;

xflags::xflags! {
    /// Simulator for the 32-bit word / 16-bit address RISC machine.
    cmd VnSimArgs {
        /// Path to the assembly file to simulate.
        required asm_file: PathBuf

        /// Prints the cost summary after the run.
        optional -s, --summary

        /// Aborts after the given number of instructions.
        optional -l, --limit limit: u64
    }
}

fn main() {
    env_logger::init();
    let args = VnSimArgs::from_env_or_exit();

    match run_wrapper::run_file(&args.asm_file, args.limit) {
        Ok((_, tracker)) => {
            if args.summary {
                println!("{}", tracker.summary());
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
