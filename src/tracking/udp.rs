//! JSON-over-UDP inference receivers
//!
//! The inference helper process posts one JSON datagram per model result.
//! Each request drains whatever queued up since the last tick and keeps only
//! the newest packet; if nothing is queued it waits up to the request timeout.

use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;

use crate::config::InferenceConfig;
use crate::error::TrackingError;
use crate::landmarks::mesh::LandmarkPacket;
use crate::landmarks::{LandmarkFrame, MeshTopology, PoseFrame};
use crate::tracking::{LandmarkSource, PoseSource};

/// Receives JSON packets of type `P` on a UDP socket
pub struct UdpFrameReceiver<P> {
    addr: String,
    socket: Option<UdpSocket>,
    timeout: Duration,
    buf: Vec<u8>,
    _packet: PhantomData<fn() -> P>,
}

impl<P: DeserializeOwned + Send> UdpFrameReceiver<P> {
    /// Create a new receiver (does not bind yet)
    pub fn new(listen_address: &str, port: u16, timeout: Duration) -> Self {
        Self {
            addr: format!("{}:{}", listen_address, port),
            socket: None,
            timeout,
            buf: vec![0u8; 65536],
            _packet: PhantomData,
        }
    }

    /// Bind the socket. Failure here means capture is unavailable.
    pub async fn start(&mut self) -> Result<(), TrackingError> {
        let socket = UdpSocket::bind(&self.addr).await.map_err(|e| {
            TrackingError::CaptureUnavailable(format!("Failed to bind to {}: {}", self.addr, e))
        })?;

        tracing::info!("Inference receiver listening on {}", self.addr);
        self.socket = Some(socket);
        Ok(())
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// Newest packet received since the previous call, if any
    pub async fn latest(&mut self) -> Result<Option<P>, TrackingError> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| TrackingError::Receive(format!("{} not started", self.addr)))?;

        let mut newest = None;
        loop {
            match socket.try_recv(&mut self.buf) {
                Ok(size) => {
                    if let Some(packet) = parse_packet::<P>(&self.buf[..size]) {
                        newest = Some(packet);
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    return Err(TrackingError::Receive(format!("Receive error: {}", e)));
                }
            }
        }

        if newest.is_some() {
            return Ok(newest);
        }

        match tokio::time::timeout(self.timeout, socket.recv(&mut self.buf)).await {
            Ok(Ok(size)) => Ok(parse_packet::<P>(&self.buf[..size])),
            Ok(Err(e)) => Err(TrackingError::Receive(format!("Receive error: {}", e))),
            Err(_) => Ok(None),
        }
    }
}

fn parse_packet<P: DeserializeOwned>(bytes: &[u8]) -> Option<P> {
    match serde_json::from_slice(bytes) {
        Ok(packet) => Some(packet),
        Err(e) => {
            tracing::warn!("Dropping malformed inference packet: {}", e);
            None
        }
    }
}

/// Face mesh source fed by the inference helper
pub struct UdpLandmarkSource {
    receiver: UdpFrameReceiver<LandmarkPacket>,
    topology: MeshTopology,
}

impl UdpLandmarkSource {
    pub fn new(config: &InferenceConfig, topology: MeshTopology) -> Self {
        Self {
            receiver: UdpFrameReceiver::new(
                &config.listen_address,
                config.landmark_port,
                Duration::from_millis(config.request_timeout_ms),
            ),
            topology,
        }
    }

    pub async fn start(&mut self) -> Result<(), TrackingError> {
        self.receiver.start().await
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.receiver.local_addr()
    }
}

impl LandmarkSource for UdpLandmarkSource {
    async fn request_landmark_frame(&mut self) -> Result<Option<LandmarkFrame>, TrackingError> {
        match self.receiver.latest().await? {
            Some(packet) => packet.into_frame(&self.topology),
            None => Ok(None),
        }
    }
}

/// Pose source fed by the inference helper
pub struct UdpPoseSource {
    receiver: UdpFrameReceiver<PoseFrame>,
}

impl UdpPoseSource {
    pub fn new(config: &InferenceConfig) -> Self {
        Self {
            receiver: UdpFrameReceiver::new(
                &config.listen_address,
                config.pose_port,
                Duration::from_millis(config.request_timeout_ms),
            ),
        }
    }

    pub async fn start(&mut self) -> Result<(), TrackingError> {
        self.receiver.start().await
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.receiver.local_addr()
    }
}

impl PoseSource for UdpPoseSource {
    async fn request_pose_frame(
        &mut self,
        flip_horizontal: bool,
    ) -> Result<Option<PoseFrame>, TrackingError> {
        Ok(self
            .receiver
            .latest()
            .await?
            .filter(|frame| !frame.is_empty())
            .map(|frame| if flip_horizontal { frame.flipped() } else { frame }))
    }
}
