use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum SweepError {
    #[error("Could not determine host name. Is /proc mounted or $HOSTNAME set?")]
    HostnameUnavailable,

    #[error("Failed to open pipe for {program}: {source}")]
    PipeOpen {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to start benchmark binary {program}: {source}")]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write output file {path}: {source}")]
    OutputFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Sweep parameter {value} does not fit in {max_width} decimal digits")]
    ArgumentTooWide { value: u64, max_width: usize },
}
