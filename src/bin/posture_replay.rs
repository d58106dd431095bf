//! Offline replay: feed recorded landmark frames (JSON lines) through the posture
//! pipeline with the recorded timestamps and print every UI event, notification
//! and speech request as JSON lines on stdout.
//!
//! Input lines:
//!   {"timestamp_us": 0, "landmarks": [{"x":0.5,"y":0.4,"z":0.0,"visibility":0.9}, ...]}
//!   {"timestamp_us": 33000, "landmarks": null}
//!   {"calibrate": true}
//!   {"audio": false}
//!
//! Usage: posture_replay <frames.jsonl> [--config config.toml] [--calibrate-at N]

use std::io::{BufRead, BufReader, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use posture_guard::config::Config;
use posture_guard::error::PostureError;
use posture_guard::log;
use posture_guard::logging::stderr_only;
use posture_guard::pipeline::{
    FrameOutcome, FramePipeline, NotificationSink, SessionControls, Sinks, SpeechSink, UiEvent,
    UiSink,
};
use posture_guard::pose::{LandmarkFrame, RemoteEstimator};

/// 入力 1 行
#[derive(Debug, Deserialize, PartialEq)]
#[serde(untagged)]
enum ReplayLine {
    Calibrate { calibrate: bool },
    Audio { audio: bool },
    Frame(LandmarkFrame),
}

/// 出力 1 行
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Record {
    Ui { timestamp_us: u64, event: UiEvent },
    Notify { timestamp_us: u64, text: String },
    Speak { timestamp_us: u64, text: String },
}

#[derive(Debug, Clone, PartialEq)]
enum Captured {
    Ui(UiEvent),
    Notify(String),
    Speak(String),
}

impl Captured {
    fn into_record(self, timestamp_us: u64) -> Record {
        match self {
            Captured::Ui(event) => Record::Ui { timestamp_us, event },
            Captured::Notify(text) => Record::Notify { timestamp_us, text },
            Captured::Speak(text) => Record::Speak { timestamp_us, text },
        }
    }
}

/// 全出力を 1 本のバッファに溜める（フレーム処理後に吐き出す）
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<Captured>>>);

impl Capture {
    fn push(&self, item: Captured) {
        if let Ok(mut buf) = self.0.lock() {
            buf.push(item);
        }
    }

    fn drain(&self) -> Vec<Captured> {
        match self.0.lock() {
            Ok(mut buf) => std::mem::take(&mut *buf),
            Err(_) => Vec::new(),
        }
    }

    fn sinks(&self) -> Sinks {
        Sinks {
            ui: Box::new(self.clone()),
            notification: Box::new(self.clone()),
            speech: Box::new(self.clone()),
        }
    }
}

impl UiSink for Capture {
    fn emit(&mut self, event: UiEvent) {
        self.push(Captured::Ui(event));
    }
}

impl NotificationSink for Capture {
    fn notify(&mut self, text: &str) -> Result<(), PostureError> {
        self.push(Captured::Notify(text.to_string()));
        Ok(())
    }
}

impl SpeechSink for Capture {
    fn speak(&mut self, text: &str) -> Result<(), PostureError> {
        self.push(Captured::Speak(text.to_string()));
        Ok(())
    }
}

struct Args {
    input: String,
    config: String,
    calibrate_at: Option<usize>,
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<Args> {
    let mut input = None;
    let mut config = "config.toml".to_string();
    let mut calibrate_at = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = args.next().context("--config needs a path")?,
            "--calibrate-at" => {
                let n = args.next().context("--calibrate-at needs a frame number")?;
                calibrate_at = Some(n.parse().with_context(|| format!("bad frame number: {}", n))?);
            }
            _ if input.is_none() => input = Some(arg),
            _ => bail!("unexpected argument: {}", arg),
        }
    }
    Ok(Args {
        input: input.context("usage: posture_replay <frames.jsonl> [--config path] [--calibrate-at N]")?,
        config,
        calibrate_at,
    })
}

#[derive(Default, Debug)]
struct Summary {
    frames: usize,
    evaluated: usize,
    undetected: usize,
    uncalibrated: usize,
    skipped: usize,
    alerts: usize,
}

fn main() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    let config = Config::load_or_default(&args.config);
    let logfile = stderr_only();
    log!(logfile, "Posture Replay ({})", env!("GIT_VERSION"));
    log!(logfile, "Input: {}", args.input);

    let file = std::fs::File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input))?;
    let reader = BufReader::new(file);

    let capture = Capture::default();
    let controls = SessionControls::new(config.audio.enabled);
    let mut pipeline = FramePipeline::new(
        RemoteEstimator::new(config.estimator),
        &config,
        controls.clone(),
        capture.sinks(),
        logfile.clone(),
    );

    let base = Instant::now();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut summary = Summary::default();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed: ReplayLine = serde_json::from_str(&line)
            .with_context(|| format!("line {}: invalid input", line_no + 1))?;

        let frame = match parsed {
            ReplayLine::Calibrate { calibrate } => {
                if calibrate {
                    if let Err(e) = controls.request_calibration() {
                        log!(logfile, "line {}: cannot calibrate: {}", line_no + 1, e);
                    }
                }
                continue;
            }
            ReplayLine::Audio { audio } => {
                controls.set_audio_enabled(audio);
                continue;
            }
            ReplayLine::Frame(frame) => frame,
        };

        if args.calibrate_at == Some(summary.frames) {
            if let Err(e) = controls.request_calibration() {
                log!(logfile, "frame {}: cannot calibrate: {}", summary.frames, e);
            }
        }

        let now = base + Duration::from_micros(frame.timestamp_us);
        match pipeline.process_frame(&frame, now) {
            FrameOutcome::Evaluated { action, .. } => {
                summary.evaluated += 1;
                if action.is_visual() {
                    summary.alerts += 1;
                }
            }
            FrameOutcome::Undetected => summary.undetected += 1,
            FrameOutcome::Uncalibrated => summary.uncalibrated += 1,
            FrameOutcome::Skipped => summary.skipped += 1,
        }
        summary.frames += 1;

        for item in capture.drain() {
            serde_json::to_writer(&mut out, &item.into_record(frame.timestamp_us))?;
            out.write_all(b"\n")?;
        }
    }
    out.flush()?;

    log!(logfile,
        "Done: {} frames ({} evaluated, {} undetected, {} uncalibrated, {} skipped), {} alerts",
        summary.frames, summary.evaluated, summary.undetected, summary.uncalibrated,
        summary.skipped, summary.alerts
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_control_lines() {
        let line: ReplayLine = serde_json::from_str(r#"{"calibrate": true}"#).unwrap();
        assert_eq!(line, ReplayLine::Calibrate { calibrate: true });
        let line: ReplayLine = serde_json::from_str(r#"{"audio": false}"#).unwrap();
        assert_eq!(line, ReplayLine::Audio { audio: false });
    }

    #[test]
    fn test_parse_frame_lines() {
        let line: ReplayLine =
            serde_json::from_str(r#"{"timestamp_us": 33000, "landmarks": null}"#).unwrap();
        assert_eq!(
            line,
            ReplayLine::Frame(LandmarkFrame { timestamp_us: 33000, landmarks: None })
        );

        let line: ReplayLine = serde_json::from_str(
            r#"{"timestamp_us": 0, "landmarks": [{"x": 0.5, "y": 0.4, "visibility": 0.9}]}"#,
        )
        .unwrap();
        match line {
            ReplayLine::Frame(frame) => {
                let points = frame.landmarks.unwrap();
                assert_eq!(points.len(), 1);
                assert!((points[0].y - 0.4).abs() < 1e-6);
            }
            other => panic!("expected frame, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_garbage_line() {
        assert!(serde_json::from_str::<ReplayLine>(r#"{"hello": 1}"#).is_err());
    }

    #[test]
    fn test_record_json_shape() {
        let record = Captured::Notify("Posture needs attention!".into()).into_record(1500);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "notify");
        assert_eq!(json["timestamp_us"], 1500);
        assert_eq!(json["text"], "Posture needs attention!");
    }

    #[test]
    fn test_capture_drains_in_order() {
        let capture = Capture::default();
        let mut sinks = capture.sinks();
        sinks.ui.emit(UiEvent::Calibrated);
        sinks.speech.speak("hello").unwrap();
        assert_eq!(
            capture.drain(),
            vec![Captured::Ui(UiEvent::Calibrated), Captured::Speak("hello".into())]
        );
        assert!(capture.drain().is_empty());
    }

    #[test]
    fn test_args() {
        let a = args(&["frames.jsonl", "--calibrate-at", "10"]).unwrap();
        assert_eq!(a.input, "frames.jsonl");
        assert_eq!(a.config, "config.toml");
        assert_eq!(a.calibrate_at, Some(10));

        assert!(args(&[]).is_err());
        assert!(args(&["a.jsonl", "b.jsonl"]).is_err());
        assert!(args(&["a.jsonl", "--calibrate-at", "x"]).is_err());
    }
}
