use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use chrono::{Local, SecondsFormat};
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use dari_core::shutdown::ShutdownSignal;

use super::{LinkState, SessionHandle};
use crate::domain::repository::ConnectionLogRepository;
use crate::error::CentralError;
use crate::protocol::digest::auth_response;
use crate::protocol::envelope::Envelope;
use crate::protocol::frame::{Deframer, Frame, encode_frame};
use crate::protocol::message::MessageId;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub dest_id: String,
    pub password: String,
    pub magic: u32,
    pub connect_timeout: Duration,
    /// Auth handshake response window.
    pub response_timeout: Duration,
    /// Alive-ping period while active.
    pub ping_interval: Duration,
    /// Window for the pong after each ping.
    pub pong_timeout: Duration,
    /// Pause between connection attempts.
    pub reconnect_delay: Duration,
}

/// What the driver hands off once a frame is past the transport layer.
///
/// Per-message failures inside these hooks must never tear down the link;
/// implementations log and swallow their own errors.
#[allow(async_fn_in_trait)]
pub trait InboundHandler: Send + Sync {
    /// Disaster notification body; the returned envelope is sent back as
    /// the confirmation frame.
    async fn on_disaster_notify(&self, body: &str) -> Option<Envelope>;

    /// Ack for an outbound report.
    async fn on_report_ack(&self, envelope: Envelope);
}

/// Supervisor loop: connect, authenticate, serve, reconnect after
/// `reconnect_delay` — until shutdown.
pub async fn run<H, C>(
    config: SessionConfig,
    handle: SessionHandle,
    handler: Arc<H>,
    connections: C,
    mut shutdown: ShutdownSignal,
) where
    H: InboundHandler,
    C: ConnectionLogRepository,
{
    loop {
        if shutdown.is_triggered() {
            break;
        }
        handle.set_state(LinkState::Connecting);
        let outcome =
            drive_connection(&config, &handle, handler.as_ref(), &connections, &mut shutdown)
                .await;
        handle.detach();

        match outcome {
            Ok(Stopped::Shutdown) => break,
            Ok(Stopped::LinkLost) => info!("upstream link lost"),
            Err(err) => warn!(error = %err, "upstream session ended"),
        }

        tokio::select! {
            _ = shutdown.recv() => break,
            _ = tokio::time::sleep(config.reconnect_delay) => {}
        }
    }
    handle.set_state(LinkState::Disconnected);
}

enum Stopped {
    Shutdown,
    LinkLost,
}

enum FrameOutcome {
    Nothing,
    /// Digest response sent; restart the auth response window.
    RestartAuthTimer,
    /// Pong (or equivalent) arrived; disarm the pending deadline.
    ClearDeadline,
    /// Authentication completed.
    Activated,
}

async fn drive_connection<H, C>(
    config: &SessionConfig,
    handle: &SessionHandle,
    handler: &H,
    connections: &C,
    shutdown: &mut ShutdownSignal,
) -> Result<Stopped, CentralError>
where
    H: InboundHandler,
    C: ConnectionLogRepository,
{
    let stream = tokio::time::timeout(
        config.connect_timeout,
        TcpStream::connect((config.host.as_str(), config.port)),
    )
    .await
    .map_err(|_| CentralError::Link("connect timeout".to_owned()))?
    .map_err(|err| CentralError::Link(format!("connect: {err}")))?;
    info!(host = %config.host, port = config.port, "connected to upstream");

    let (mut read_half, mut write_half) = stream.into_split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if write_half.write_all(&frame).await.is_err() {
                break;
            }
        }
        let _ = write_half.shutdown().await;
    });
    handle.attach(tx.clone());

    // First connect request carries only our id; the challenge comes back
    // as a 401 with realm and nonce.
    send_envelope(
        &tx,
        config.magic,
        MessageId::ReqSysCon,
        &Envelope {
            dest_id: Some(config.dest_id.clone()),
            ..Default::default()
        },
    )?;
    handle.set_state(LinkState::AwaitingChallenge);
    let mut deadline = Some(Instant::now() + config.response_timeout);
    let mut was_active = false;

    let mut deframer = Deframer::new(config.magic);
    let mut chunk = BytesMut::with_capacity(16 * 1024);
    let mut ping = tokio::time::interval_at(
        Instant::now() + config.ping_interval,
        config.ping_interval,
    );
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let result = loop {
        // `deadline` is Copy; the block owns its snapshot for this iteration.
        let wait_deadline = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = shutdown.recv() => break Ok(Stopped::Shutdown),

            _ = wait_deadline => {
                break Err(match handle.state() {
                    LinkState::Active => CentralError::Link("pong timeout".to_owned()),
                    _ => CentralError::Link("auth response timeout".to_owned()),
                });
            }

            _ = ping.tick(), if handle.state() == LinkState::Active => {
                let alive = Envelope {
                    dest_id: Some(config.dest_id.clone()),
                    cmd: Some("alive".to_owned()),
                    time: Some(Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)),
                    ..Default::default()
                };
                if let Err(err) = send_envelope(&tx, config.magic, MessageId::ReqSysSts, &alive) {
                    break Err(err);
                }
                deadline = Some(Instant::now() + config.pong_timeout);
            }

            read = read_half.read_buf(&mut chunk) => {
                match read {
                    Ok(0) => break Ok(Stopped::LinkLost),
                    Ok(_) => {
                        deframer.extend(&chunk);
                        chunk.clear();
                    }
                    Err(err) => break Err(CentralError::Link(format!("read: {err}"))),
                }

                let mut failed = None;
                loop {
                    match deframer.next_frame() {
                        Ok(Some(frame)) => {
                            match process_frame(config, handle, handler, connections, &tx, frame)
                                .await
                            {
                                Ok(FrameOutcome::Nothing) => {}
                                Ok(FrameOutcome::RestartAuthTimer) => {
                                    deadline = Some(Instant::now() + config.response_timeout);
                                }
                                Ok(FrameOutcome::ClearDeadline) => deadline = None,
                                Ok(FrameOutcome::Activated) => {
                                    deadline = None;
                                    was_active = true;
                                }
                                Err(err) => {
                                    failed = Some(err);
                                    break;
                                }
                            }
                        }
                        Ok(None) => break,
                        Err(framing) => {
                            // Buffer purged; the connection itself survives.
                            warn!(error = %framing, "framing error; buffer discarded");
                        }
                    }
                }
                if let Some(err) = failed {
                    break Err(err);
                }
            }
        }
    };

    if was_active {
        record(connections, "DISCONNECTED", None).await;
    }
    writer.abort();
    result
}

async fn process_frame<H, C>(
    config: &SessionConfig,
    handle: &SessionHandle,
    handler: &H,
    connections: &C,
    tx: &mpsc::UnboundedSender<Bytes>,
    frame: Frame,
) -> Result<FrameOutcome, CentralError>
where
    H: InboundHandler,
    C: ConnectionLogRepository,
{
    let Some(message_id) = MessageId::from_u32(frame.header.message_id) else {
        warn!(message_id = frame.header.message_id, "unknown message id");
        return Ok(FrameOutcome::Nothing);
    };
    let body = String::from_utf8_lossy(&frame.body).into_owned();

    match message_id {
        MessageId::ResSysCon => handle_connect_reply(config, handle, connections, tx, &body).await,

        MessageId::ResSysSts => {
            debug!("alive pong");
            Ok(FrameOutcome::ClearDeadline)
        }

        MessageId::NfyDisInfo => {
            if let Some(reply) = handler.on_disaster_notify(&body).await {
                match reply.to_xml() {
                    Ok(xml) => {
                        let frame =
                            encode_frame(MessageId::CnfDisInfo, config.magic, xml.as_bytes());
                        if tx.send(frame).is_err() {
                            return Err(CentralError::Link("writer gone".to_owned()));
                        }
                    }
                    Err(err) => error!(error = %err, "failed to build confirmation"),
                }
            }
            Ok(FrameOutcome::Nothing)
        }

        id if id.is_report_ack() => {
            match Envelope::parse(&body) {
                Ok(envelope) => handler.on_report_ack(envelope).await,
                // Per-message failure; the session stays up.
                Err(err) => warn!(error = %err, "unparseable report ack"),
            }
            Ok(FrameOutcome::Nothing)
        }

        other => {
            debug!(message_id = ?other, "ignoring message");
            Ok(FrameOutcome::Nothing)
        }
    }
}

async fn handle_connect_reply<C: ConnectionLogRepository>(
    config: &SessionConfig,
    handle: &SessionHandle,
    connections: &C,
    tx: &mpsc::UnboundedSender<Bytes>,
    body: &str,
) -> Result<FrameOutcome, CentralError> {
    let envelope = Envelope::parse(body)
        .map_err(|err| CentralError::Parsing(format!("connect reply: {err}")))?;
    let result_code = envelope.result_code.as_deref().unwrap_or("");

    match handle.state() {
        LinkState::AwaitingChallenge => match result_code {
            "401" => {
                let (Some(realm), Some(nonce)) = (envelope.realm.as_deref(), envelope.nonce.as_deref())
                else {
                    return Err(CentralError::Authentication(
                        "challenge missing realm or nonce".to_owned(),
                    ));
                };
                let response = auth_response(&config.dest_id, realm, &config.password, nonce);
                send_envelope(
                    tx,
                    config.magic,
                    MessageId::ReqSysCon,
                    &Envelope {
                        dest_id: Some(config.dest_id.clone()),
                        realm: Some(realm.to_owned()),
                        nonce: Some(nonce.to_owned()),
                        response: Some(response),
                        ..Default::default()
                    },
                )?;
                handle.set_state(LinkState::AwaitingAuthResult);
                Ok(FrameOutcome::RestartAuthTimer)
            }
            other => {
                record(connections, "AUTH_FAILED", Some(other)).await;
                Err(CentralError::Authentication(format!(
                    "expected challenge, got resultCode {other}"
                )))
            }
        },

        LinkState::AwaitingAuthResult => match result_code {
            "200" => {
                handle.set_state(LinkState::Active);
                record(connections, "CONNECTED", None).await;
                info!("upstream session active");
                Ok(FrameOutcome::Activated)
            }
            other => {
                record(connections, "AUTH_FAILED", Some(other)).await;
                Err(CentralError::Authentication(format!(
                    "auth rejected with resultCode {other}"
                )))
            }
        },

        // A connect reply outside the handshake is noise.
        _ => {
            warn!(result_code, "unexpected connect reply; ignoring");
            Ok(FrameOutcome::Nothing)
        }
    }
}

fn send_envelope(
    tx: &mpsc::UnboundedSender<Bytes>,
    magic: u32,
    message_id: MessageId,
    envelope: &Envelope,
) -> Result<(), CentralError> {
    let xml = envelope.to_xml()?;
    let frame = encode_frame(message_id, magic, xml.as_bytes());
    tx.send(frame)
        .map_err(|_| CentralError::Link("writer gone".to_owned()))
}

async fn record<C: ConnectionLogRepository>(connections: &C, event: &str, detail: Option<&str>) {
    if let Err(err) = connections.record(event, detail).await {
        warn!(event, error = %err, "connection log write failed");
    }
}
