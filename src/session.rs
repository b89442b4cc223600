//! # Canvas Sessions
//!
//! A [`Session`] is one canvas being built: fixed dimensions, an append-only
//! element log, and the surface that always equals the render of that log.
//!
//! [`SessionStore`] maps identifiers to sessions. The map lock is held only
//! for lookups and inserts; each session has its own mutex, so appends to the
//! same canvas are serialized while different canvases never wait on each
//! other.

use chrono::{DateTime, Utc};
use image::RgbaImage;
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::element::Element;
use crate::error::EaselError;
use crate::render::replay::ReplayEngine;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LENGTH: usize = 9;

/// Generate a short opaque session identifier (`c_` + 9 base-36 chars).
///
/// Collisions are not checked; at this length they are improbable for the
/// number of canvases one process holds.
pub fn generate_id() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("c_{}", suffix)
}

/// One canvas being built.
#[derive(Debug)]
pub struct Session {
    id: String,
    width: u32,
    height: u32,
    surface: RgbaImage,
    elements: Vec<Element>,
    created_at: DateTime<Utc>,
    last_accessed: Instant,
}

impl Session {
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            surface: RgbaImage::new(width, height),
            elements: Vec::new(),
            created_at: Utc::now(),
            last_accessed: Instant::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Update last access time to keep session alive.
    pub fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_accessed)
    }

    /// Replay the log plus `element` onto the surface, then append it.
    ///
    /// Returns the new log length.
    pub fn commit(&mut self, element: Element, engine: &dyn ReplayEngine) -> usize {
        engine.apply(&mut self.surface, &self.elements, &element);
        self.elements.push(element);
        self.touch();
        self.elements.len()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            width: self.width,
            height: self.height,
            element_count: self.elements.len(),
            elements: self.elements.clone(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

/// Serializable view of a session (no pixel data).
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub element_count: usize,
    pub elements: Vec<Element>,
    pub created_at: String,
}

pub type SharedSession = Arc<Mutex<Session>>;

/// Process-wide session map.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SharedSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new empty session, replacing any session with the same id.
    pub async fn create(&self, id: String, width: u32, height: u32) -> SessionSummary {
        let session = Session::new(id.clone(), width, height);
        let summary = session.summary();
        let replaced = self
            .sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)))
            .is_some();
        if replaced {
            debug!(id = %summary.id, "Replaced existing session");
        }
        summary
    }

    pub async fn get(&self, id: &str) -> Result<SharedSession, EaselError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| EaselError::NotFound(id.to_string()))
    }

    /// Commit an element to a session under its lock.
    ///
    /// The replay runs on the blocking pool while the session stays locked,
    /// so concurrent appends to one canvas apply strictly one after another.
    pub async fn append(
        &self,
        id: &str,
        element: Element,
        engine: Arc<dyn ReplayEngine>,
    ) -> Result<usize, EaselError> {
        let session = self.get(id).await?;
        let mut guard = session.lock_owned().await;

        tokio::task::spawn_blocking(move || guard.commit(element, engine.as_ref()))
            .await
            .map_err(|e| EaselError::Io(std::io::Error::other(format!("Replay task failed: {}", e))))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop sessions idle for at least `ttl`. Sessions currently locked by a
    /// request are in use and always kept.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(s) => s.idle_for(now) < ttl,
            Err(_) => true,
        });
        before - sessions.len()
    }
}
