use crate::connection::Connection;
use crate::error::{CalaosError, Result};
use crate::home::{Home, Room};
use crate::item::{Event, Item};
use crate::protocol::{raw_string, HomePayload, PollKind, PollPayload, RegisterPayload, Request};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The server drops registered polling queues after five minutes of
/// inactivity; past that window a held handle is known dead.
const POLLING_MAX_WAIT: Duration = Duration::from_secs(5 * 60);

/// A Calaos client
///
/// The `CalaosClient` owns the connection to the server and a local
/// mirror of the whole installation: every room and item from the home
/// configuration, each holding its last known translated state. Driving
/// [`CalaosClient::poll`] in a loop keeps the mirror synchronized and
/// yields an [`Event`] for every observed state change.
///
/// Mutating operations take `&mut self`: polling is a single logical
/// stream of control, and two overlapping polls on one client would race
/// on the registration handle.
///
/// # Example
///
/// ```no_run
/// use calaos_client::CalaosClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut client =
///         CalaosClient::connect("https://192.168.1.40", "user", "secret").await?;
///
///     loop {
///         for event in client.poll().await? {
///             println!("{}", event);
///         }
///         tokio::time::sleep(std::time::Duration::from_millis(500)).await;
///     }
/// }
/// ```
pub struct CalaosClient {
    conn: Arc<Connection>,
    home: Home,
    poll_id: Option<String>,
    last_poll: Option<Instant>,
}

impl CalaosClient {
    /// Connect to a Calaos server and load the home configuration
    ///
    /// The base URI is usually `http[s]://A.B.C.D`; use
    /// [`discover`](crate::discover) to find the address.
    pub async fn connect(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let conn = Arc::new(Connection::new(base_url, username, password)?);
        let mut client = Self {
            conn,
            home: Home::default(),
            poll_id: None,
            last_poll: None,
        };
        client.reload_home().await?;
        Ok(client)
    }

    /// Reload the complete home configuration, resetting rooms and items
    ///
    /// Needed when the server is reconfigured while the client keeps
    /// running. The registry is rebuilt off to the side and swapped in
    /// whole: on failure the previous rooms and items stay untouched.
    /// Item handles obtained before the reload keep their last state but
    /// no longer receive updates. No events are emitted for the initial
    /// snapshot values.
    pub async fn reload_home(&mut self) -> Result<()> {
        tracing::debug!("Getting the whole home");
        let response = self.conn.send(Request::GetHome).await?;
        let payload: HomePayload = serde_json::from_value(response)?;
        self.home = Home::from_payload(payload, &self.conn);
        Ok(())
    }

    /// Fetch the current state of every known item and return the changes
    ///
    /// Events come back in response order. Unknown ids in the response
    /// are skipped, never fatal.
    pub async fn refresh_all(&mut self) -> Result<Vec<Event>> {
        tracing::debug!("Getting all states from known items");
        let response = self
            .conn
            .send(Request::GetState {
                items: self.home.item_ids(),
            })
            .await?;
        let map = response.as_object().ok_or_else(|| {
            CalaosError::InvalidResponse("get_state response is not an object".to_string())
        })?;

        let mut events = Vec::new();
        for (id, value) in map {
            self.apply_raw(id, &raw_string(value), &mut events);
        }
        Ok(events)
    }

    /// Drain pending state changes from the server and return the events
    ///
    /// The first call registers a polling queue with the server and
    /// catches up with a full refresh, since a fresh queue carries no
    /// history. Later calls drain the queue; when the server reports the
    /// queue gone (expired handles are dropped after an idle window), the
    /// client re-registers and refreshes transparently, with the same
    /// return contract. An empty list is the normal idle outcome.
    pub async fn poll(&mut self) -> Result<Vec<Event>> {
        let stale = self
            .last_poll
            .map_or(true, |at| at.elapsed() > POLLING_MAX_WAIT);
        let uuid = match self.poll_id.clone() {
            Some(uuid) if !stale => uuid,
            _ => return self.register_and_refresh().await,
        };

        let response = self
            .conn
            .send(Request::PollListen {
                kind: PollKind::Get,
                uuid: Some(uuid),
            })
            .await?;
        let payload: PollPayload = serde_json::from_value(response)?;

        if !payload.success {
            tracing::debug!("Polling queue rejected; registering a new one");
            self.poll_id = None;
            return self.register_and_refresh().await;
        }

        if !payload.events.is_empty() {
            tracing::debug!("Raw events from polling: {:?}", payload.events);
        }

        // Within one batch the last value recorded for an id wins; events
        // keep the order ids first appeared in.
        let mut order: Vec<String> = Vec::new();
        let mut latest: HashMap<String, String> = HashMap::new();
        for record in &payload.events {
            let data = record.get("data");
            let Some(id) = data.and_then(|d| d.get("id")).map(raw_string) else {
                tracing::warn!("Skipping poll event without id: {}", record);
                continue;
            };
            let Some(state) = data.and_then(|d| d.get("state")).map(raw_string) else {
                tracing::warn!("Skipping poll event without state: {}", record);
                continue;
            };
            if latest.insert(id.clone(), state).is_none() {
                order.push(id);
            }
        }

        let mut events = Vec::new();
        for id in &order {
            if let Some(raw) = latest.get(id) {
                self.apply_raw(id, raw, &mut events);
            }
        }

        self.last_poll = Some(Instant::now());
        Ok(events)
    }

    async fn register_and_refresh(&mut self) -> Result<Vec<Event>> {
        tracing::debug!("Registering to the polling");
        let response = self
            .conn
            .send(Request::PollListen {
                kind: PollKind::Register,
                uuid: None,
            })
            .await?;
        let payload: RegisterPayload = serde_json::from_value(response)?;
        let uuid = payload
            .uuid
            .filter(|uuid| !uuid.is_empty())
            .ok_or_else(|| {
                CalaosError::InvalidResponse("poll registration returned no uuid".to_string())
            })?;

        self.poll_id = Some(uuid);
        self.last_poll = Some(Instant::now());
        self.refresh_all().await
    }

    fn apply_raw(&self, id: &str, raw: &str, events: &mut Vec<Event>) {
        let Some(item) = self.home.item(id) else {
            tracing::debug!("Skipping state for unknown item {}", id);
            return;
        };
        match item.apply_observed_state(raw) {
            Ok(true) => events.push(Event::capture(item.clone())),
            Ok(false) => {}
            Err(e) => tracing::warn!("Skipping unreadable state for item {}: {}", id, e),
        }
    }

    /// Rooms in the installation, in snapshot order
    pub fn rooms(&self) -> &[Room] {
        self.home.rooms()
    }

    /// Look up an item by id
    pub fn item(&self, id: &str) -> Option<&Arc<Item>> {
        self.home.item(id)
    }

    /// Iterate over all known items
    pub fn items(&self) -> impl Iterator<Item = &Arc<Item>> {
        self.home.items()
    }

    /// Items declaring the given wire type
    pub fn items_by_type(&self, item_type: &str) -> &[Arc<Item>] {
        self.home.items_by_type(item_type)
    }

    /// Wire types present in this installation
    pub fn item_types(&self) -> Vec<&str> {
        self.home.item_types()
    }

    /// Items declaring the given GUI type
    pub fn items_by_gui_type(&self, gui_type: &str) -> &[Arc<Item>] {
        self.home.items_by_gui_type(gui_type)
    }

    /// GUI types present in this installation
    pub fn item_gui_types(&self) -> Vec<&str> {
        self.home.item_gui_types()
    }
}
