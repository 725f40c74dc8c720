//! Per-connection worker: reads frames and routes them into the lobby
//!
//! A connection moves through `Connected -> Queued -> Paired` as the lobby
//! records it, and ends when the peer sends `{quit}`, closes, breaks the
//! framing rules, or the server shuts down. Every exit path runs the same
//! cleanup.

use crate::config::ServerConfig;
use crate::lobby::{announce_pairing, EnqueueOutcome, SharedLobby};
use crate::registry::ConnId;
use log::{debug, info, warn};
use shared::{read_frame, write_frame, ClientFrame, ServerFrame};
use std::net::SocketAddr;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;

/// Whether the read loop keeps going after a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// Serves one client from accept to close
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    lobby: SharedLobby,
    config: ServerConfig,
    mut close_rx: broadcast::Receiver<()>,
) {
    let (reader, writer) = stream.into_split();
    let (outbox, inbox) = mpsc::channel(config.outbox_capacity);
    let id = lobby.lock().await.connect(addr, outbox);
    let mut writer_task = tokio::spawn(write_frames(id, writer, inbox));
    let mut writer_done = false;

    let mut reader = BufReader::new(reader);
    let mut named = false;

    loop {
        tokio::select! {
            frame = read_frame(&mut reader, config.max_frame_len) => match frame {
                Ok(Some(line)) if !named => {
                    named = true;
                    lobby.lock().await.set_name(id, line);
                }
                Ok(Some(line)) => {
                    if dispatch(id, &line, &lobby, &config).await == Flow::Close {
                        break;
                    }
                }
                Ok(None) => {
                    info!("{} closed the connection", id);
                    break;
                }
                Err(e) => {
                    warn!("Dropping {} ({}): {}", id, addr, e);
                    break;
                }
            },
            _ = close_rx.recv() => {
                debug!("{} stopping for shutdown", id);
                break;
            }
            // The writer only stops early when its socket failed or the lobby
            // already dropped this connection
            finished = &mut writer_task, if !writer_done => {
                writer_done = true;
                if let Err(e) = finished {
                    warn!("Writer for {} panicked: {}", id, e);
                }
                debug!("{} writer stopped, closing", id);
                break;
            }
        }
    }

    lobby.lock().await.cleanup(id);
    if writer_done {
        return;
    }
    // The writer exits once cleanup drops the outbox and pending frames are out
    match timeout(config.flush_timeout, &mut writer_task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Writer for {} panicked: {}", id, e),
        Err(_) => {
            warn!("{} did not take its last frames in time", id);
            writer_task.abort();
        }
    }
}

/// Routes one frame received after the name frame
pub async fn dispatch(id: ConnId, line: &str, lobby: &SharedLobby, config: &ServerConfig) -> Flow {
    let frame = ClientFrame::parse(line);
    debug!("{} -> {:?}", id, frame);

    let mut state = lobby.lock().await;
    // Cleaned up by someone else, e.g. after its socket failed mid-send
    if !state.is_connected(id) {
        return Flow::Close;
    }

    match frame {
        ClientFrame::EnterGame => {
            let outcome = state.enqueue(id);
            drop(state);
            if let EnqueueOutcome::Matched(pairings) = outcome {
                for pairing in pairings {
                    tokio::spawn(announce_pairing(
                        lobby.clone(),
                        pairing,
                        config.pairing_delay,
                    ));
                }
            }
        }
        ClientFrame::QuitGame => {
            state.quit_game(id);
        }
        ClientFrame::Quit => {
            info!("{} quit", id);
            state.acknowledge_quit(id);
            return Flow::Close;
        }
        ClientFrame::Move(payload) => {
            // Rejections are already reported to the sender
            let _ = state.submit_move(id, &payload);
        }
        ClientFrame::Chat(text) => {
            if text.is_empty() {
                return Flow::Continue;
            }
            let _ = state.relay_chat(id, &text);
        }
    }
    Flow::Continue
}

/// Drains a connection's outbox onto its socket, then closes the write side
async fn write_frames<W>(id: ConnId, mut writer: W, mut inbox: mpsc::Receiver<ServerFrame>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = inbox.recv().await {
        if let Err(e) = write_frame(&mut writer, &frame.encode()).await {
            warn!("Failed to send to {}: {}", id, e);
            return;
        }
    }
    // Already closed by the peer is fine
    let _ = writer.shutdown().await;
}
