//! stderr と `logs/` 配下のファイルへ同時に書くロガー

use anyhow::Result;
use std::io::Write;
use std::sync::{Arc, Mutex};

pub type LogFile = Arc<Mutex<Box<dyn Write + Send>>>;

/// `logs/<prefix>_YYYYmmdd_HHMMSS.log` を作る
pub fn open_log_file(prefix: &str) -> Result<(LogFile, String)> {
    std::fs::create_dir_all("logs")?;
    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = format!("logs/{}_{}.log", prefix, ts);
    let file = std::fs::File::create(&path)?;
    eprintln!("Log: {}", path);
    let writer: Box<dyn Write + Send> = Box::new(std::io::BufWriter::new(file));
    Ok((Arc::new(Mutex::new(writer)), path))
}

/// ファイルに残さないロガー（stderr のみ）
pub fn stderr_only() -> LogFile {
    let writer: Box<dyn Write + Send> = Box::new(std::io::sink());
    Arc::new(Mutex::new(writer))
}

#[macro_export]
macro_rules! log {
    ($logfile:expr, $($arg:tt)*) => {{
        use ::std::io::Write as _;
        let msg = format!($($arg)*);
        eprintln!("{}", msg);
        if let Ok(mut f) = $logfile.lock() {
            let _ = writeln!(f, "{}", msg);
            let _ = f.flush();
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_log_macro_writes_line() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let writer: Box<dyn Write + Send> = Box::new(Shared(Arc::clone(&buf)));
        let logfile: LogFile = Arc::new(Mutex::new(writer));
        crate::log!(logfile, "frame {} ok", 3);
        let text = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
        assert_eq!(text, "frame 3 ok\n");
    }

    #[test]
    fn test_stderr_only_accepts_writes() {
        let logfile = stderr_only();
        crate::log!(logfile, "discarded");
    }
}
