//! Posture server: receives landmark frames from an estimator client over TCP,
//! runs posture analysis on a single processing thread, and streams UI events,
//! notifications and alerts back to the client.

use std::time::Duration;

use anyhow::{Context, Result};
use futures::StreamExt as _;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc::{self, error::TrySendError};

use posture_guard::config::Config;
use posture_guard::error::PostureError;
use posture_guard::log;
use posture_guard::logging::{open_log_file, LogFile};
use posture_guard::pipeline::{
    frame_channel, CommandSpeech, FramePipeline, FrameSender, NotificationSink, NullSink,
    SessionControls, Sinks, SpeechSink, UiEvent, UiSink,
};
use posture_guard::pose::{EstimatorOptions, LandmarkFrame, PoseEstimator, RemoteEstimator};
use posture_guard::protocol::{self, ClientMessage, ServerMessage};

const CONFIG_PATH: &str = "config.toml";
const OUTBOX_DEPTH: usize = 64;
const DROP_REPORT_INTERVAL: Duration = Duration::from_secs(5);

// ===========================================================================
// Sinks (processing thread → TCP task)
// ===========================================================================

/// 毎フレーム上書きされる更新か（詰まっていれば捨ててよい）
fn is_transient(event: &UiEvent) -> bool {
    matches!(event, UiEvent::Overlay(_) | UiEvent::Status(_) | UiEvent::Feedback(_))
}

struct ChannelUi(mpsc::Sender<ServerMessage>);

impl UiSink for ChannelUi {
    fn emit(&mut self, event: UiEvent) {
        if is_transient(&event) {
            let _ = self.0.try_send(ServerMessage::Ui(event));
        } else {
            // 警告・キャリブレーション結果は一度きりなので空きを待つ
            // （処理スレッドは block_in_place 内で動く）
            let _ = self.0.blocking_send(ServerMessage::Ui(event));
        }
    }
}

struct ChannelNotify(mpsc::Sender<ServerMessage>);

impl NotificationSink for ChannelNotify {
    fn notify(&mut self, text: &str) -> Result<(), PostureError> {
        match self.0.try_send(ServerMessage::Notify { text: text.to_string() }) {
            Ok(()) | Err(TrySendError::Full(_)) => Ok(()),
            Err(TrySendError::Closed(_)) => {
                Err(PostureError::SinkUnavailable("client disconnected".to_string()))
            }
        }
    }
}

fn speech_sink(command: &[String]) -> Box<dyn SpeechSink + Send> {
    if command.is_empty() {
        Box::new(NullSink)
    } else {
        Box::new(CommandSpeech::new(command.to_vec()))
    }
}

// ===========================================================================
// TCP receive loop
// ===========================================================================

async fn tcp_receive_loop<S>(
    stream: S,
    frames: FrameSender<LandmarkFrame>,
    controls: SessionControls,
    options: EstimatorOptions,
    mut out_rx: mpsc::Receiver<ServerMessage>,
    logfile: LogFile,
    verbose: bool,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let framed = protocol::message_stream(stream);
    let (mut sink, mut reader) = framed.split();

    protocol::send_message(&mut sink, &ServerMessage::Options(options)).await?;
    let mut drop_report = tokio::time::interval(DROP_REPORT_INTERVAL);

    loop {
        tokio::select! {
            result = protocol::recv_message::<ClientMessage, _>(&mut reader) => {
                let msg = match result? {
                    Some(msg) => msg,
                    None => return Ok(()),
                };
                match msg {
                    ClientMessage::Landmarks(frame) => {
                        if frames.offer(frame).is_err() {
                            return Ok(());
                        }
                    }
                    ClientMessage::TriggerCalibration => {
                        let ack = match controls.request_calibration() {
                            Ok(()) => ServerMessage::CalibrationAck { ok: true, reason: None },
                            Err(e) => {
                                log!(logfile, "Cannot calibrate: {}", e);
                                ServerMessage::CalibrationAck { ok: false, reason: Some(e.to_string()) }
                            }
                        };
                        protocol::send_message(&mut sink, &ack).await?;
                    }
                    ClientMessage::SetAudio { enabled } => {
                        controls.set_audio_enabled(enabled);
                        log!(logfile, "Audio: {}", if enabled { "ON" } else { "OFF" });
                        protocol::send_message(&mut sink, &ServerMessage::AudioState { enabled }).await?;
                    }
                }
            }
            Some(out_msg) = out_rx.recv() => {
                protocol::send_message(&mut sink, &out_msg).await?;
            }
            _ = drop_report.tick() => {
                let dropped = frames.take_dropped();
                if verbose && dropped > 0 {
                    log!(logfile, "[frames] dropped {} while busy", dropped);
                }
            }
        }
    }
}

// ===========================================================================
// Main
// ===========================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load_or_default(CONFIG_PATH);
    let (logfile, _log_path) = open_log_file("server")?;

    log!(logfile, "Posture Server ({})", env!("GIT_VERSION"));
    log!(logfile, "Listen: {}", config.server.listen_addr);
    log!(logfile,
        "Alert: {} frames, speech cooldown {}ms",
        config.alert.bad_frames, config.alert.speech_cooldown_ms
    );
    log!(logfile,
        "Estimator: detection={} tracking={} model={:?}",
        config.estimator.min_detection_confidence,
        config.estimator.min_tracking_confidence,
        config.estimator.model_complexity
    );
    log!(logfile, "Console: 'c' + Enter to calibrate, 'a' + Enter to toggle audio");

    let controls = SessionControls::new(config.audio.enabled);
    {
        let controls = controls.clone();
        let logfile = logfile.clone();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match stdin.read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
                match line.trim() {
                    "c" => match controls.request_calibration() {
                        Ok(()) => log!(logfile, "[input] calibration requested"),
                        Err(e) => log!(logfile, "[input] cannot calibrate: {}", e),
                    },
                    "a" => {
                        let enabled = controls.toggle_audio();
                        log!(logfile, "[input] audio {}", if enabled { "ON" } else { "OFF" });
                    }
                    _ => {}
                }
            }
        });
    }

    let bind_addr: std::net::SocketAddr = config
        .server
        .listen_addr
        .parse()
        .context("invalid listen_addr")?;
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    log!(logfile, "Listening on {}", bind_addr);

    loop {
        let (tcp_stream, addr) = listener.accept().await?;
        tcp_stream.set_nodelay(true)?;
        log!(logfile, "Client connected: {}", addr);
        controls.begin_session();

        let (frame_tx, frame_rx) = frame_channel::<LandmarkFrame>(config.server.frame_queue);
        let (out_tx, out_rx) = mpsc::channel::<ServerMessage>(OUTBOX_DEPTH);

        let sinks = Sinks {
            ui: Box::new(ChannelUi(out_tx.clone())),
            notification: Box::new(ChannelNotify(out_tx)),
            speech: speech_sink(&config.audio.speech_command),
        };
        // 新しいセッションは基準姿勢なしから始まる
        let mut pipeline = FramePipeline::new(
            RemoteEstimator::new(config.estimator),
            &config,
            controls.clone(),
            sinks,
            logfile.clone(),
        );

        let tcp_task = {
            let controls = controls.clone();
            let logfile = logfile.clone();
            let options = pipeline.estimator().options();
            let verbose = config.server.verbose;
            tokio::spawn(async move {
                if let Err(e) =
                    tcp_receive_loop(tcp_stream, frame_tx, controls, options, out_rx, logfile.clone(), verbose).await
                {
                    log!(logfile, "TCP error: {:#}", e);
                }
            })
        };

        tokio::task::block_in_place(|| pipeline.run(&frame_rx));

        tcp_task.abort();
        log!(logfile, "Client disconnected, waiting for next connection...");
    }
}
