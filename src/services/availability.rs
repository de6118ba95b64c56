use crate::models;
use crate::views::AgentPresence;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const DEFAULT_TTL: Duration = Duration::from_secs(3600);

struct Entry {
    username: String,
    since: DateTime<Utc>,
    expires_at: Instant,
}

/// Process-wide view of which agents hold an open notification channel.
/// Ephemeral, expiry-based, never authoritative: readers must tolerate
/// staleness, and a process restart simply empties it.
pub struct AgentAvailability {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

impl AgentAvailability {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Marks the agent available, refreshing the expiry window. Called on
    /// notification-channel connect and on every heartbeat.
    pub async fn set_available(&self, agent: &models::User) {
        let mut entries = self.entries.write().await;
        let expires_at = Instant::now() + self.ttl;
        entries
            .entry(agent.id.clone())
            .and_modify(|entry| entry.expires_at = expires_at)
            .or_insert_with(|| Entry {
                username: agent.username.clone(),
                since: Utc::now(),
                expires_at,
            });
    }

    pub async fn set_unavailable(&self, agent_id: &str) {
        self.entries.write().await.remove(agent_id);
    }

    pub async fn is_available(&self, agent_id: &str) -> bool {
        let entries = self.entries.read().await;
        entries
            .get(agent_id)
            .map(|entry| entry.expires_at > Instant::now())
            .unwrap_or(false)
    }

    /// Currently-available agents; prunes expired entries on the way out.
    pub async fn snapshot(&self) -> Vec<AgentPresence> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);

        let mut agents: Vec<AgentPresence> = entries
            .iter()
            .map(|(id, entry)| AgentPresence {
                user_id: id.clone(),
                username: entry.username.clone(),
                since: entry.since,
            })
            .collect();
        agents.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        agents
    }
}

impl Default for AgentAvailability {
    fn default() -> Self {
        Self::new()
    }
}
