use crate::uci::{parse_uci_message, UciError, UciMessage};
use crate::{EngineCommand, EngineError, EngineEvent, EngineInfo, GoParams, LineProvider};
use chess::{format_uci_move, AnalysisRequest, AnalysisScore, CandidateLine};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct StockfishEngine {
    process: Child,
    command_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    multipv: Option<u32>,
    analysis_timeout: Duration,
}

/// Configuration for engine performance tuning.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Explicit binary; when unset, common install locations are probed.
    pub path: Option<PathBuf>,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
    /// Upper bound for a single `candidate_lines` request.
    pub analysis_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: None,
            threads: None,
            hash_mb: None,
            analysis_timeout: Duration::from_secs(120),
        }
    }
}

impl StockfishEngine {
    /// Spawn a new Stockfish instance with full configuration.
    #[tracing::instrument(level = "info")]
    pub async fn spawn_with_config(config: EngineConfig) -> Result<Self, EngineError> {
        let path = match &config.path {
            Some(path) => path.clone(),
            None => find_stockfish_path().ok_or(EngineError::NotFound(None))?,
        };
        tracing::info!("Using Stockfish at: {:?}", path);

        let mut process = tokio::process::Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!("Failed to spawn Stockfish: {}", e);
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::NotFound(Some(path.clone()))
                } else {
                    EngineError::Spawn(e)
                }
            })?;

        let mut stdin = process.stdin.take().ok_or(UciError::NoStdin)?;
        let stdout = process.stdout.take().ok_or(UciError::NoStdout)?;

        tracing::debug!("Sending 'uci' command");
        stdin.write_all(b"uci\n").await?;
        stdin.flush().await?;

        let (command_tx, mut command_rx) = mpsc::channel::<EngineCommand>(32);
        let (event_tx, mut event_rx) = mpsc::channel::<EngineEvent>(256);

        // Output reader task
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        tracing::warn!("Stockfish stdout EOF - engine closed");
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        tracing::trace!("UCI << {}", trimmed);

                        let event = match parse_uci_message(trimmed) {
                            Ok(UciMessage::UciOk) | Ok(UciMessage::ReadyOk) => EngineEvent::Ready,
                            Ok(UciMessage::BestMove { mv, .. }) => {
                                tracing::debug!("Received bestmove: {:?}", mv);
                                EngineEvent::BestMove(mv)
                            }
                            Ok(UciMessage::Info(info)) => EngineEvent::Info(info),
                            Err(UciError::InvalidScore(e)) => {
                                tracing::warn!("Unreadable score in {:?}: {}", trimmed, e);
                                EngineEvent::InvalidScore(e)
                            }
                            Ok(msg) => {
                                tracing::trace!("Ignoring UCI message: {:?}", msg);
                                continue;
                            }
                            Err(e) => {
                                tracing::trace!("Failed to parse UCI message: {}", e);
                                continue;
                            }
                        };

                        if event_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Error reading from Stockfish stdout: {}", e);
                        break;
                    }
                }
            }
            tracing::debug!("Output reader task exiting");
        });

        match tokio::time::timeout(HANDSHAKE_TIMEOUT, wait_ready(&mut event_rx)).await {
            Ok(Ok(())) => tracing::debug!("Received uciok, engine ready"),
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                tracing::error!("Timeout waiting for uciok");
                return Err(EngineError::Handshake(
                    "timeout waiting for uciok".to_string(),
                ));
            }
        }

        let mut options = Vec::new();
        if let Some(threads) = config.threads {
            options.push(("Threads", threads.clamp(1, 1024)));
        }
        if let Some(hash_mb) = config.hash_mb {
            options.push(("Hash", hash_mb.clamp(1, 1 << 20)));
        }
        for (name, value) in options {
            tracing::info!("Setting {} to {}", name, value);
            stdin
                .write_all(format!("setoption name {} value {}\n", name, value).as_bytes())
                .await?;
        }
        stdin.flush().await?;

        // Command processor task: serializes commands onto stdin.
        tokio::spawn(async move {
            while let Some(cmd) = command_rx.recv().await {
                let quit = matches!(cmd, EngineCommand::Quit);
                let cmd_str = format_command(&cmd);
                tracing::trace!("UCI >> {}", cmd_str.trim_end());

                if let Err(e) = stdin.write_all(cmd_str.as_bytes()).await {
                    tracing::error!("Failed to write to stdin: {}", e);
                    break;
                }
                if let Err(e) = stdin.flush().await {
                    tracing::error!("Failed to flush stdin: {}", e);
                    break;
                }
                if quit {
                    break;
                }
            }
            tracing::debug!("Command processor task exiting");
        });

        let mut engine = Self {
            process,
            command_tx,
            event_rx,
            multipv: None,
            analysis_timeout: config.analysis_timeout,
        };
        engine.send_command(EngineCommand::IsReady).await?;
        engine.wait_ready().await?;

        tracing::info!("Stockfish engine spawned and initialized successfully");
        Ok(engine)
    }

    /// Send a command to the engine
    pub async fn send_command(&self, cmd: EngineCommand) -> Result<(), EngineError> {
        tracing::debug!("Queueing command: {:?}", cmd);
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| EngineError::ChannelClosed)
    }

    /// Receive an event from the engine
    pub async fn recv_event(&mut self) -> Option<EngineEvent> {
        self.event_rx.recv().await
    }

    async fn wait_ready(&mut self) -> Result<(), EngineError> {
        tokio::time::timeout(HANDSHAKE_TIMEOUT, wait_ready(&mut self.event_rx))
            .await
            .map_err(|_| EngineError::Timeout(HANDSHAKE_TIMEOUT))?
    }

    /// Search `fen` to `request.depth` and collect the final line for every
    /// MultiPV rank.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn analyse(
        &mut self,
        fen: &str,
        request: AnalysisRequest,
    ) -> Result<Vec<CandidateLine>, EngineError> {
        // Anything still queued belongs to an earlier search.
        while self.event_rx.try_recv().is_ok() {}

        let breadth = request.breadth.max(1);
        if self.multipv != Some(breadth) {
            self.send_command(EngineCommand::SetOption {
                name: "MultiPV".to_string(),
                value: Some(breadth.to_string()),
            })
            .await?;
            self.multipv = Some(breadth);
        }
        self.send_command(EngineCommand::SetPosition {
            fen: fen.to_string(),
            moves: Vec::new(),
        })
        .await?;
        self.send_command(EngineCommand::IsReady).await?;
        self.wait_ready().await?;

        self.send_command(EngineCommand::Go(GoParams {
            depth: Some(request.depth),
            ..Default::default()
        }))
        .await?;

        let timeout = self.analysis_timeout;
        let collected = tokio::time::timeout(timeout, collect_lines(&mut self.event_rx)).await;
        match collected {
            Ok(Ok(by_rank)) => {
                let lines = to_candidate_lines(by_rank, breadth);
                tracing::debug!(lines = lines.len(), "analysis complete");
                Ok(lines)
            }
            Ok(Err(e)) => {
                if matches!(e, EngineError::InvalidScore(_)) {
                    let _ = self.send_command(EngineCommand::Stop).await;
                }
                Err(e)
            }
            Err(_) => {
                tracing::warn!(?timeout, "analysis timed out, stopping search");
                let _ = self.send_command(EngineCommand::Stop).await;
                Err(EngineError::Timeout(timeout))
            }
        }
    }

    /// Shutdown the engine
    pub async fn shutdown(mut self) {
        let _ = self.send_command(EngineCommand::Quit).await;
        let _ = tokio::time::timeout(Duration::from_secs(1), self.process.wait()).await;
        let _ = self.process.kill().await;
    }
}

impl LineProvider for StockfishEngine {
    async fn candidate_lines(
        &mut self,
        fen: &str,
        request: AnalysisRequest,
    ) -> Result<Vec<CandidateLine>, EngineError> {
        self.analyse(fen, request).await
    }
}

async fn wait_ready(event_rx: &mut mpsc::Receiver<EngineEvent>) -> Result<(), EngineError> {
    while let Some(event) = event_rx.recv().await {
        if matches!(event, EngineEvent::Ready) {
            return Ok(());
        }
    }
    Err(EngineError::ChannelClosed)
}

/// Latest info per MultiPV rank until `bestmove` arrives.
async fn collect_lines(
    event_rx: &mut mpsc::Receiver<EngineEvent>,
) -> Result<BTreeMap<u32, EngineInfo>, EngineError> {
    let mut by_rank = BTreeMap::new();
    while let Some(event) = event_rx.recv().await {
        match event {
            EngineEvent::Info(info) if info.score.is_some() => {
                let rank = info.multipv.unwrap_or(1);
                by_rank.insert(rank, info);
            }
            EngineEvent::BestMove(_) => return Ok(by_rank),
            EngineEvent::InvalidScore(e) => return Err(EngineError::InvalidScore(e)),
            _ => {}
        }
    }
    Err(EngineError::ChannelClosed)
}

fn to_candidate_lines(by_rank: BTreeMap<u32, EngineInfo>, breadth: u32) -> Vec<CandidateLine> {
    by_rank
        .into_iter()
        .filter(|(rank, _)| (1..=breadth).contains(rank))
        .filter_map(|(rank, info)| {
            let score: AnalysisScore = info.score?.into();
            Some(CandidateLine {
                pv: info.pv.into_iter().map(format_uci_move).collect(),
                score,
                depth: info.depth.unwrap_or(0),
                nodes: info.nodes.unwrap_or(0),
                time_ms: info.time_ms.unwrap_or(0),
                rank,
            })
        })
        .collect()
}

fn format_command(cmd: &EngineCommand) -> String {
    match cmd {
        EngineCommand::SetPosition { fen, moves } => {
            let mut position_cmd = format!("position fen {}", fen);
            if !moves.is_empty() {
                position_cmd.push_str(" moves");
                for mv in moves {
                    position_cmd.push(' ');
                    position_cmd.push_str(&format_uci_move(*mv));
                }
            }
            position_cmd.push('\n');
            position_cmd
        }
        EngineCommand::SetOption { name, value } => match value {
            Some(val) => format!("setoption name {} value {}\n", name, val),
            None => format!("setoption name {}\n", name),
        },
        EngineCommand::IsReady => "isready\n".to_string(),
        EngineCommand::Go(params) => {
            let mut go_cmd = "go".to_string();
            if let Some(movetime) = params.movetime {
                go_cmd.push_str(&format!(" movetime {}", movetime));
            } else if let Some(depth) = params.depth {
                go_cmd.push_str(&format!(" depth {}", depth));
            } else if params.infinite {
                go_cmd.push_str(" infinite");
            } else {
                go_cmd.push_str(" movetime 1000"); // Default 1 second
            }
            go_cmd.push('\n');
            go_cmd
        }
        EngineCommand::Stop => "stop\n".to_string(),
        EngineCommand::Quit => "quit\n".to_string(),
    }
}

/// Find Stockfish executable in common locations
pub fn find_stockfish_path() -> Option<PathBuf> {
    let paths = [
        "/usr/local/bin/stockfish",
        "/usr/bin/stockfish",
        "/opt/homebrew/bin/stockfish",
        "/usr/games/stockfish",
    ];

    if let Some(found) = paths.iter().map(Path::new).find(|p| p.exists()) {
        return Some(found.to_path_buf());
    }

    // Fall back to PATH lookup
    std::env::var_os("PATH").and_then(|path| {
        std::env::split_paths(&path)
            .map(|dir| dir.join("stockfish"))
            .find(|candidate| candidate.exists())
    })
}
