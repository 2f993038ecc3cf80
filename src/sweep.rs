use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};

use crate::child::{ChannelPoint, LoadPoint, Measurement, SLOTS, Sample};
use crate::errors::SweepError;
use crate::host;
use crate::table::{self, Table};

/// Repetitions per sweep point (a fixed statistical design, not retry logic).
pub const DEFAULT_REPS: u32 = 5;

/// Delivery modes exercised by the channels variant. Mode 1 (round-robin)
/// is accepted by the children but not swept.
const CHANNEL_MODES: [u32; 2] = [0, 2];
const MODE_NAMES: [&str; 3] = ["random", "round-robin", "shared"];

const SERVER_DIVISIONS: u32 = 4;
const CLIENT_DIVISIONS: u32 = 16;

/// Update loads (percent of modifying operations) swept by the latency variant.
const LOAD_PERCENTS: [u32; 4] = [0, 20, 50, 100];
const CORE_DIVISIONS: u32 = 32;

const CHANNEL_HEADER: &str = "#clients\t#messages\tthroughput (MB/s)\tlatency (us/msg)";

/// Evenly divide a resource count into sweep coordinates.
///
/// The first point is always the degenerate single-unit run; later points are
/// `total * i / divisions`, skipping any that would repeat the single-unit
/// point. `divide(8, 4)` is `[1, 2, 4, 6, 8]`.
pub fn divide(total: u32, divisions: u32) -> Vec<u32> {
    let mut points = vec![1];
    for i in 1..=divisions {
        let in_use = total * i / divisions;
        if in_use == 1 {
            continue;
        }
        points.push(in_use);
    }
    points
}

/// Fold one repetition into the running per-slot mean.
///
/// Each repetition contributes `value / reps`, keeping intermediate
/// magnitudes bounded by the final mean instead of by the slot sum.
fn accumulate(mean: &mut [f64; SLOTS], sample: &Sample, reps: u32) {
    for (slot, value) in mean.iter_mut().zip(sample.values) {
        *slot += value / f64::from(reps);
    }
}

/// Run `reps` repetitions of one sweep point and return the averaged slots.
///
/// Spawn failures abort the whole sweep — a binary that cannot start once
/// invalidates every later point. Degraded samples (short output, unparsable
/// lines) are averaged with their zero defaults and flagged on stderr.
fn measure_average(
    program: &Path,
    args: &[String],
    reps: u32,
) -> Result<[f64; SLOTS], SweepError> {
    let mut mean = [0.0; SLOTS];
    for _ in 0..reps {
        let sample = Measurement::spawn(program, args)?.wait();
        if sample.poisoned > 0 {
            eprintln!(
                "Warning: {} unparsable metric line(s) from {} (averaged as 0)",
                sample.poisoned,
                program.display()
            );
        }
        accumulate(&mut mean, &sample, reps);
    }
    Ok(mean)
}

/// Presentation-level channel metrics from averaged raw slots
/// {message size B, exchange count, duration s}.
fn channel_row_metrics(mean: &[f64; SLOTS], clients: u32) -> [f64; 3] {
    let [size, exchanges, duration] = *mean;
    if exchanges <= 0.0 || duration <= 0.0 {
        return [exchanges.max(0.0), 0.0, 0.0];
    }
    let throughput_mb_s = size * exchanges / duration / 1e6;
    let latency_us_msg = duration * f64::from(clients) / exchanges * 1e6;
    [exchanges, throughput_mb_s, latency_us_msg]
}

fn announce_file(file_name: &str) {
    println!(
        "{}",
        format!("Output file '{file_name}'")
            .if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
}

/// Sweep one channel benchmark binary over mode × servers × clients.
///
/// One output file per (mode, server count); one row per client count.
pub fn run_channels(binary: &Path, reps: u32) -> Result<()> {
    let host = host::hostname()?;
    let servers_total = host::processor_count();
    let server_divisions = SERVER_DIVISIONS.min(servers_total);
    let clients_total = servers_total * 2;
    let client_divisions = CLIENT_DIVISIONS.min(clients_total);

    for mode in CHANNEL_MODES {
        let mode_name = MODE_NAMES[mode as usize];
        for servers in divide(servers_total, server_divisions) {
            let file_name = table::channel_file_name(&host, mode_name, servers);
            let mut table = Table::create(Path::new(&file_name), CHANNEL_HEADER)?;
            announce_file(&file_name);

            for clients in divide(clients_total, client_divisions) {
                print!("  With {clients} client(s)... ");
                let _ = std::io::stdout().flush();

                let point = ChannelPoint {
                    mode,
                    servers,
                    clients,
                };
                let mean = measure_average(binary, &point.args()?, reps)?;
                table.write_row(clients, &channel_row_metrics(&mean, clients))?;
                println!("done.");
            }
        }
    }
    Ok(())
}

/// Sweep one or more data-structure benchmark binaries over load × cores.
///
/// One output file per update load; one row per core count, with a
/// three-column group (get, set, remove latency) per binary.
pub fn run_latency(name: &str, binaries: &[PathBuf], reps: u32) -> Result<()> {
    let host = host::hostname()?;
    // Sweep a third past the processor count so the tables show latencies
    // past saturation.
    let cores_total = (host::processor_count() * 4 / 3).max(1);
    let core_divisions = if CORE_DIVISIONS >= cores_total {
        cores_total - 1
    } else {
        CORE_DIVISIONS
    };

    for load in LOAD_PERCENTS {
        let file_name = table::latency_file_name(&host, name, load);
        let mut table = Table::create(Path::new(&file_name), &latency_header(binaries))?;
        announce_file(&file_name);

        for cores in divide(cores_total, core_divisions) {
            print!("  With {cores} core(s): ");
            let mut row = Vec::with_capacity(binaries.len() * SLOTS);
            for (i, binary) in binaries.iter().enumerate() {
                if i != 0 {
                    print!(", ");
                }
                print!("{}", binary.display());
                let _ = std::io::stdout().flush();

                let point = LoadPoint {
                    cores,
                    update_percent: load,
                };
                let mean = measure_average(binary, &point.args()?, reps)?;
                row.extend_from_slice(&mean);
            }
            println!();
            table.write_row(cores, &row)?;
        }
    }
    Ok(())
}

/// `#cores` followed by one column-group label per binary (each binary owns
/// three metric columns, so each label is padded by two empty cells).
fn latency_header(binaries: &[PathBuf]) -> String {
    let mut header = String::from("#cores");
    for binary in binaries {
        header.push('\t');
        header.push_str(&binary.display().to_string());
        header.push_str("\t\t");
    }
    header
}
