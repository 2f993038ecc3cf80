use crate::errors::SweepError;

/// Host name used to prefix output-file names.
///
/// Reads `/proc/sys/kernel/hostname`, falling back to `$HOSTNAME`. Result
/// tables from different machines land next to each other, so a missing
/// host name is fatal rather than silently defaulted.
pub fn hostname() -> Result<String, SweepError> {
    if let Ok(name) = std::fs::read_to_string("/proc/sys/kernel/hostname") {
        let name = name.trim();
        if !name.is_empty() {
            return Ok(name.to_string());
        }
    }
    match std::env::var("HOSTNAME") {
        Ok(name) if !name.trim().is_empty() => Ok(name.trim().to_string()),
        _ => Err(SweepError::HostnameUnavailable),
    }
}

/// Number of available processors, minimum 1.
pub fn processor_count() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processor_count_is_positive() {
        assert!(processor_count() >= 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn hostname_resolves_on_linux() {
        let name = hostname().unwrap();
        assert!(!name.is_empty());
        assert!(!name.contains('\n'));
    }
}
