use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};

use crate::errors::SweepError;
use crate::parse::MetricParser;

/// Every repetition yields exactly three metric slots.
pub const SLOTS: usize = 3;

/// Widest decimal encoding accepted for a child argument.
pub const MAX_ARG_WIDTH: usize = 15;

const READ_CHUNK: usize = 256;

/// One sweep point of the channels variant: fully determines the child's
/// argument vector (`-m <mode> -s <servers> -c <clients> -o`).
#[derive(Debug, Clone, Copy)]
pub struct ChannelPoint {
    pub mode: u32,
    pub servers: u32,
    pub clients: u32,
}

impl ChannelPoint {
    pub fn args(&self) -> Result<Vec<String>, SweepError> {
        Ok(vec![
            "-m".to_string(),
            decimal_arg(u64::from(self.mode))?,
            "-s".to_string(),
            decimal_arg(u64::from(self.servers))?,
            "-c".to_string(),
            decimal_arg(u64::from(self.clients))?,
            "-o".to_string(),
        ])
    }
}

/// One sweep point of the latency variant (`-n <cores> -u <update%> -p
/// <put%> -o`). The put percentage is always half the update percentage.
#[derive(Debug, Clone, Copy)]
pub struct LoadPoint {
    pub cores: u32,
    pub update_percent: u32,
}

impl LoadPoint {
    pub fn args(&self) -> Result<Vec<String>, SweepError> {
        Ok(vec![
            "-n".to_string(),
            decimal_arg(u64::from(self.cores))?,
            "-u".to_string(),
            decimal_arg(u64::from(self.update_percent))?,
            "-p".to_string(),
            decimal_arg(u64::from(self.update_percent / 2))?,
            "-o".to_string(),
        ])
    }
}

/// Decimal-ASCII encoding of one numeric child argument.
///
/// Rejects representations wider than `MAX_ARG_WIDTH` — a sweep coordinate
/// that large is a caller bug, reported as an error rather than an abort.
pub fn decimal_arg(value: u64) -> Result<String, SweepError> {
    let text = value.to_string();
    if text.len() > MAX_ARG_WIDTH {
        return Err(SweepError::ArgumentTooWide {
            value,
            max_width: MAX_ARG_WIDTH,
        });
    }
    Ok(text)
}

/// Metric slots collected from one repetition, zero-initialized.
///
/// `filled` counts the lines consumed (at most `SLOTS`); slots never filled
/// keep 0.0. A poisoned line consumes its slot as 0.0 and bumps `poisoned`
/// so callers can tell degraded samples from clean zeroes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub values: [f64; SLOTS],
    pub filled: usize,
    pub poisoned: usize,
}

impl Sample {
    fn empty() -> Self {
        Sample {
            values: [0.0; SLOTS],
            filled: 0,
            poisoned: 0,
        }
    }
}

/// One in-flight repetition: the spawned child plus the read end of its
/// merged stdout+stderr pipe.
///
/// Both pipe ends and the child handle are dropped on every exit path;
/// `wait` additionally reaps the child so no zombie is left behind.
pub struct Measurement {
    child: Child,
    reader: io::PipeReader,
}

impl Measurement {
    /// Spawn `program` with both of its output streams redirected into a
    /// single pipe.
    ///
    /// The parent's copies of the write end are closed before this returns,
    /// so end-of-stream on the reader tracks child exit exactly.
    pub fn spawn(program: &Path, args: &[String]) -> Result<Self, SweepError> {
        let (reader, stdout) = io::pipe().map_err(|source| SweepError::PipeOpen {
            program: program.to_path_buf(),
            source,
        })?;
        let stderr = stdout.try_clone().map_err(|source| SweepError::PipeOpen {
            program: program.to_path_buf(),
            source,
        })?;

        // The Command is a temporary: it (and the parent-side write ends it
        // holds) is dropped at the end of this statement.
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|source| SweepError::Spawn {
                program: program.to_path_buf(),
                source,
            })?;

        Ok(Measurement { child, reader })
    }

    /// Read the child's output until three values are in or the stream ends,
    /// then reap the child.
    ///
    /// A read error truncates the sample (unfilled slots stay 0.0) — partial
    /// data is still handed back and the sweep goes on. The exit status is
    /// collected only to avoid a zombie; its value is ignored.
    pub fn wait(mut self) -> Sample {
        let mut sample = Sample::empty();
        let mut parser = MetricParser::new();
        let mut buf = [0u8; READ_CHUNK];

        'read: loop {
            let len = match self.reader.read(&mut buf) {
                Ok(0) => break,
                Ok(len) => len,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    eprintln!("Read from benchmark pipe failed: {err}");
                    break;
                }
            };

            let mut rest = &buf[..len];
            while let Some(next) = parser.push(rest) {
                match parser.reset() {
                    Some(value) => sample.values[sample.filled] = value,
                    None => sample.poisoned += 1,
                }
                sample.filled += 1;
                if sample.filled == SLOTS {
                    break 'read;
                }
                if next >= rest.len() {
                    continue 'read;
                }
                rest = &rest[next..];
            }
        }

        // Close our end before blocking on the child.
        drop(self.reader);
        let _ = self.child.wait();
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sh(script: &str) -> Sample {
        let program = PathBuf::from("/bin/sh");
        let args = vec!["-c".to_string(), script.to_string()];
        Measurement::spawn(&program, &args)
            .expect("failed to spawn /bin/sh")
            .wait()
    }

    // ---- wait ----

    #[test]
    fn three_clean_values() {
        let sample = sh("printf '1\\n2\\n3\\n'");
        assert_eq!(sample.values, [1.0, 2.0, 3.0]);
        assert_eq!(sample.filled, 3);
        assert_eq!(sample.poisoned, 0);
    }

    #[test]
    fn short_output_leaves_default_slot() {
        let sample = sh("printf '1\\n2\\n'");
        assert_eq!(sample.values, [1.0, 2.0, 0.0]);
        assert_eq!(sample.filled, 2);
    }

    #[test]
    fn silent_child_yields_all_defaults() {
        let sample = sh("exit 0");
        assert_eq!(sample.values, [0.0, 0.0, 0.0]);
        assert_eq!(sample.filled, 0);
    }

    #[test]
    fn stderr_is_merged_in_order() {
        let sample = sh("echo 1; echo 2 >&2; echo 3");
        assert_eq!(sample.values, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn extra_lines_beyond_three_are_ignored() {
        let sample = sh("printf '1\\n2\\n3\\n4\\n5\\n'");
        assert_eq!(sample.values, [1.0, 2.0, 3.0]);
        assert_eq!(sample.filled, 3);
    }

    #[test]
    fn fractional_values_cross_read_chunks() {
        // Pad the first line well past the 256-byte read buffer so the
        // second value is guaranteed to straddle a chunk boundary.
        let sample = sh(
            "printf 'x%.0s' $(seq 300); printf '\\n12.5\\n0,25\\n'",
        );
        assert_eq!(sample.poisoned, 1);
        assert_eq!(sample.values, [0.0, 12.5, 0.25]);
    }

    #[test]
    fn poisoned_line_consumes_slot_as_zero() {
        let sample = sh("printf 'not a number\\n7\\n8\\n'");
        assert_eq!(sample.values, [0.0, 7.0, 8.0]);
        assert_eq!(sample.filled, 3);
        assert_eq!(sample.poisoned, 1);
    }

    #[test]
    fn child_keeps_writing_after_third_value() {
        // wait() must still return and reap even though the child writes
        // more than it will ever read.
        let sample = sh("printf '1\\n2\\n3\\n'; printf 'tail%.0s' $(seq 100)");
        assert_eq!(sample.values, [1.0, 2.0, 3.0]);
    }

    // ---- spawn ----

    #[test]
    fn missing_program_is_a_spawn_error() {
        let program = PathBuf::from("/nonexistent/benchmark-binary");
        let result = Measurement::spawn(&program, &[]);
        assert!(matches!(result, Err(SweepError::Spawn { .. })));
    }

    // ---- argument construction ----

    #[test]
    fn decimal_arg_small_value() {
        assert_eq!(decimal_arg(48).unwrap(), "48");
    }

    #[test]
    fn decimal_arg_rejects_overwide_value() {
        let result = decimal_arg(u64::MAX);
        assert!(matches!(
            result,
            Err(SweepError::ArgumentTooWide { .. })
        ));
    }

    #[test]
    fn channel_point_args() {
        let point = ChannelPoint {
            mode: 2,
            servers: 8,
            clients: 16,
        };
        assert_eq!(
            point.args().unwrap(),
            ["-m", "2", "-s", "8", "-c", "16", "-o"]
        );
    }

    #[test]
    fn load_point_args_halve_update_for_put() {
        let point = LoadPoint {
            cores: 4,
            update_percent: 50,
        };
        assert_eq!(
            point.args().unwrap(),
            ["-n", "4", "-u", "50", "-p", "25", "-o"]
        );
    }
}
