use std::fs::{self, OpenOptions};
use std::path::Path;
use anyhow::Result;
use env_logger::{Env, Target};

/// Send logs to `path` instead of the terminal, which the UI owns. Level
/// comes from `RUST_LOG`, defaulting to `info`.
pub fn init(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_secs()
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("palace-chat.log");

        init(&path).unwrap();
        log::info!("logger ready");

        assert!(path.exists());
    }
}
