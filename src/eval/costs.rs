//! Cost evaluation over the bundled demo programs

use std::process;

use vn_sim::computer::Computer;
use vn_sim::error::{SimulatorError, SimulatorResult};
use vn_sim::run_wrapper;

const INSTRUCTION_LIMIT: u64 = 1_000_000;

struct Demo {
    name: &'static str,
    source: &'static str,
    setup: fn(&mut Computer),
}

fn io_error(message: String) -> SimulatorError {
    SimulatorError::IoError(std::io::Error::new(
        std::io::ErrorKind::Other,
        message,
    ))
}

fn main() {
    env_logger::init();
    if let Err(e) = run_eval() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_eval() -> SimulatorResult<()> {
    let demos = [
        Demo {
            name: "fibonacci",
            source: include_str!("../../demos/fibonacci.asm"),
            setup: |c| {
                c.poke(100, 1);
                c.poke(101, 1);
            },
        },
        Demo {
            name: "integer_division",
            source: include_str!("../../demos/integer_division.asm"),
            setup: |c| {
                c.poke(100, 1_236_738);
                c.poke(101, 457);
            },
        },
        Demo {
            name: "linked_list",
            source: include_str!("../../demos/linked_list.asm"),
            setup: |c| {
                let elements =
                    [(2, 60), (3, 56), (5, 62), (7, 81), (11, u32::MAX)];
                let mut addr = 50;
                for (value, next) in elements {
                    c.poke(addr, value);
                    c.poke(addr + 1, next);
                    addr = next as u16;
                }
                c.poke(100, 50);
            },
        },
    ];

    std::fs::create_dir_all("eval")?;
    let output_path = "eval/sim_costs.csv";
    let mut writer = csv::Writer::from_path(output_path).map_err(|e| {
        io_error(format!("Failed to create CSV file '{}': {}", output_path, e))
    })?;

    writer
        .write_record([
            "Program",
            "Instructions",
            "Cache locations used",
            "RAM locations used",
            "Total ns",
        ])
        .map_err(|e| io_error(format!("Failed to write header to CSV: {}", e)))?;

    for demo in &demos {
        eprintln!("Running demo: {}", demo.name);
        let mut computer = run_wrapper::prepare(demo.source)?;
        (demo.setup)(&mut computer);
        let tracker =
            run_wrapper::run(&mut computer, Some(INSTRUCTION_LIMIT))?;

        let report = tracker.report();
        writer
            .write_record([
                demo.name.to_string(),
                tracker.instructions_executed().to_string(),
                report.cache_locations_used.to_string(),
                report.ram_locations_used.to_string(),
                report.total_ns.to_string(),
            ])
            .map_err(|e| {
                io_error(format!("Failed to write record to CSV: {}", e))
            })?;
    }

    writer
        .flush()
        .map_err(|e| io_error(format!("Failed to flush CSV: {}", e)))?;
    eprintln!("Wrote {}", output_path);
    Ok(())
}
