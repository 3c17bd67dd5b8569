use crate::connection::Connection;
use crate::error::{CalaosError, Result};
use crate::protocol::{IoDirection, ItemData, Request};
use crate::state::{StateValue, Translator};
use std::sync::{Arc, Mutex};

/// One controllable or observable point in the installation
///
/// An `Item` owns its identity and metadata from the home snapshot, its
/// current translated state, and a handle to the connection for issuing
/// commands. State is mutated by the synchronization engine when observed
/// values arrive, and by some commands that optimistically reflect their
/// outcome locally; every other context should treat [`Item::state`]
/// snapshots as read-only copies.
pub struct Item {
    id: String,
    name: String,
    kind: String,
    gui_type: String,
    io_type: IoDirection,
    var_type: String,
    visible: bool,
    room: String,
    translator: Translator,
    state: Mutex<StateValue>,
    conn: Arc<Connection>,
}

impl Item {
    /// Build an item from one snapshot record; fails if the snapshot
    /// state is not in the translator's canonical form
    pub(crate) fn from_data(data: ItemData, room: &str, conn: Arc<Connection>) -> Result<Self> {
        let translator = Translator::for_type(&data.kind);
        let state = translator.parse(&data.state)?;
        Ok(Self {
            id: data.id,
            name: data.name,
            kind: data.kind,
            gui_type: data.gui_type,
            io_type: data.io_type,
            var_type: data.var_type,
            visible: data.visible,
            room: room.to_string(),
            translator,
            state: Mutex::new(state),
            conn,
        })
    }

    /// Unique id of the item, stable across reloads
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name from the configuration
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared wire type (e.g. `WODigital`)
    pub fn item_type(&self) -> &str {
        &self.kind
    }

    /// GUI type category from the configuration
    pub fn gui_type(&self) -> &str {
        &self.gui_type
    }

    /// Direction of the item
    pub fn io_type(&self) -> IoDirection {
        self.io_type
    }

    /// Variable type from the configuration
    pub fn var_type(&self) -> &str {
        &self.var_type
    }

    /// Whether the configuration marks this item as visible
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Name of the room this item belongs to
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Translation strategy attached to this item's type
    pub fn translator(&self) -> Translator {
        self.translator
    }

    /// Last known canonical state; no I/O
    pub fn state(&self) -> StateValue {
        self.state.lock().unwrap().clone()
    }

    /// Apply an externally observed raw value
    ///
    /// Parses the value through the item's translator and compares it to
    /// the current state; returns `true` when the state changed. This is
    /// the single producer of change events.
    pub(crate) fn apply_observed_state(&self, raw: &str) -> Result<bool> {
        let translated = self.translator.parse(raw)?;
        let mut state = self.state.lock().unwrap();
        if *state == translated {
            return Ok(false);
        }
        *state = translated;
        Ok(true)
    }

    fn set_local(&self, value: StateValue) {
        *self.state.lock().unwrap() = value;
    }

    /// Send a raw command payload to this item
    ///
    /// Fails with [`CalaosError::NotAnOutput`] if the item's direction
    /// does not permit output, and [`CalaosError::CommandRejected`] if the
    /// server refuses the command. The local state is never touched here;
    /// typed command methods layer their own update policy on top.
    pub async fn send_command(&self, payload: &str) -> Result<()> {
        if !self.io_type.is_output() {
            return Err(CalaosError::NotAnOutput {
                id: self.id.clone(),
            });
        }

        tracing::debug!("Setting state of {} ({}) to: {}", self.id, self.name, payload);

        let response = self
            .conn
            .send(Request::SetState {
                io_type: self.io_type,
                id: self.id.clone(),
                value: payload.to_string(),
            })
            .await?;

        let ack: crate::protocol::AckPayload = serde_json::from_value(response)?;
        if !ack.success {
            tracing::error!("Failed to set state of {} ({})", self.id, self.name);
            return Err(CalaosError::CommandRejected {
                id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Encode a typed value and send it as a command
    ///
    /// The local mirror is updated to the given value once the server
    /// accepts the command.
    pub async fn set_state_value(&self, value: StateValue) -> Result<()> {
        let payload = self.translator.encode(&value);
        self.send_command(&payload).await?;
        self.set_local(value);
        Ok(())
    }

    // ========== Switch-style commands ==========

    /// Turn the item on
    ///
    /// Binary outputs reflect the new state immediately; dimmers restore
    /// whatever level they last held, so their state waits for the next
    /// observed value.
    pub async fn turn_on(&self) -> Result<()> {
        self.send_command("true").await?;
        if self.translator == Translator::Binary {
            self.set_local(StateValue::Bool(true));
        }
        Ok(())
    }

    /// Turn the item off
    pub async fn turn_off(&self) -> Result<()> {
        self.send_command("false").await?;
        match self.translator {
            Translator::Binary => self.set_local(StateValue::Bool(false)),
            Translator::Percentage => self.set_local(StateValue::Percent(0)),
            _ => {}
        }
        Ok(())
    }

    /// Toggle the item; the resulting state arrives with the next poll
    pub async fn toggle(&self) -> Result<()> {
        self.send_command("toggle").await
    }

    /// Pulse the output following a millisecond on/off pattern
    pub async fn impulse(&self, pattern: &[u64]) -> Result<()> {
        let mut command = String::from("impulse");
        for step in pattern {
            command.push_str(&format!(" {step}"));
        }
        self.send_command(&command).await
    }

    // ========== Dimmer commands ==========

    /// Set a dimmer to the given level
    ///
    /// Command levels are clamped into 1..=100 before encoding (0 is not
    /// a valid command level; use [`Item::turn_off`]).
    pub async fn set_percent(&self, level: u8) -> Result<()> {
        let level = level.clamp(1, 100);
        self.send_command(&format!("set {level}")).await?;
        if self.translator == Translator::Percentage {
            self.set_local(StateValue::Percent(level));
        }
        Ok(())
    }

    /// Set the level a dimmer will come back on at, without turning it on
    pub async fn set_percent_off(&self, level: u8) -> Result<()> {
        let level = level.clamp(1, 100);
        self.send_command(&format!("set off {level}")).await
    }

    /// Raise a dimmer by the given number of points
    pub async fn raise_by(&self, amount: u8) -> Result<()> {
        let amount = amount.clamp(1, 100);
        self.send_command(&format!("up {amount}")).await
    }

    /// Lower a dimmer by the given number of points
    pub async fn lower_by(&self, amount: u8) -> Result<()> {
        let amount = amount.clamp(1, 100);
        self.send_command(&format!("down {amount}")).await
    }

    /// Start a hold-to-dim gesture
    pub async fn hold_press(&self) -> Result<()> {
        self.send_command("hold press").await
    }

    /// End a hold-to-dim gesture
    pub async fn hold_stop(&self) -> Result<()> {
        self.send_command("hold stop").await
    }

    // ========== Shutter commands ==========

    /// Start opening the shutter
    pub async fn open(&self) -> Result<()> {
        self.send_command("up").await
    }

    /// Start closing the shutter
    pub async fn close(&self) -> Result<()> {
        self.send_command("down").await
    }

    /// Stop the current motion (also stops a running timer)
    pub async fn stop(&self) -> Result<()> {
        self.send_command("stop").await
    }

    /// Move the shutter to the given position; the authoritative position
    /// is reported back through polling once the motion ends
    pub async fn set_position(&self, position: u8) -> Result<()> {
        let position = position.clamp(1, 100);
        self.send_command(&format!("set {position}")).await
    }

    /// Open for the given number of milliseconds
    pub async fn impulse_open(&self, duration_ms: u64) -> Result<()> {
        self.send_command(&format!("impulse up {duration_ms}")).await
    }

    /// Close for the given number of milliseconds
    pub async fn impulse_close(&self, duration_ms: u64) -> Result<()> {
        self.send_command(&format!("impulse down {duration_ms}")).await
    }

    /// Run the shutter's calibration cycle
    pub async fn calibrate(&self) -> Result<()> {
        self.send_command("calibrate").await
    }

    // ========== Timer commands ==========

    /// Start a timer
    pub async fn start(&self) -> Result<()> {
        self.send_command("start").await
    }

    /// Reprogram a timer
    pub async fn reset_timer(&self, hours: u32, minutes: u32, seconds: u32, ms: u32) -> Result<()> {
        self.send_command(&format!("{hours}:{minutes}:{seconds}:{ms}"))
            .await
    }

    // ========== Counter and string commands ==========

    /// Set an integer register
    pub async fn set_value(&self, value: i64) -> Result<()> {
        self.send_command(&value.to_string()).await?;
        if self.translator == Translator::Counter {
            self.set_local(StateValue::Int(value));
        }
        Ok(())
    }

    /// Increment an integer register by one
    pub async fn increment(&self) -> Result<()> {
        self.send_command("inc").await
    }

    /// Increment an integer register by the given amount
    pub async fn increment_by(&self, amount: i64) -> Result<()> {
        self.send_command(&format!("inc {amount}")).await
    }

    /// Decrement an integer register by one
    pub async fn decrement(&self) -> Result<()> {
        self.send_command("dec").await
    }

    /// Decrement an integer register by the given amount
    pub async fn decrement_by(&self, amount: i64) -> Result<()> {
        self.send_command(&format!("dec {amount}")).await
    }

    /// Set a string register
    pub async fn set_text(&self, value: &str) -> Result<()> {
        self.send_command(value).await?;
        if self.translator == Translator::Passthrough {
            self.set_local(StateValue::Text(value.to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} ({}/{})", self.id, self.name, self.kind, self.io_type)
    }
}

impl std::fmt::Debug for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Item")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type", &self.kind)
            .field("io_type", &self.io_type)
            .field("state", &self.state())
            .finish()
    }
}

/// A detected state transition for one item
///
/// Captured at the moment the change is applied; two events are equal iff
/// they refer to the same item id and carry the same state value.
#[derive(Debug, Clone)]
pub struct Event {
    item: Arc<Item>,
    state: StateValue,
}

impl Event {
    /// Capture an event from the item's state after a change was applied
    pub(crate) fn capture(item: Arc<Item>) -> Self {
        let state = item.state();
        Self { item, state }
    }

    /// Item this event is related to
    pub fn item(&self) -> &Arc<Item> {
        &self.item
    }

    /// State recorded when the event was created
    pub fn state(&self) -> &StateValue {
        &self.state
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.item.id() == other.item.id() && self.state == other.state
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} => {}", self.item, self.state)
    }
}
