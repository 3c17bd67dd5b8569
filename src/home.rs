use crate::connection::Connection;
use crate::item::Item;
use crate::protocol::HomePayload;
use std::collections::HashMap;
use std::sync::Arc;

/// A named group of items in the Calaos configuration
///
/// Rooms are presentation-only: they carry a name, a free-form category,
/// and the items in snapshot order.
pub struct Room {
    name: String,
    kind: String,
    items: Vec<Arc<Item>>,
}

impl Room {
    /// Name of the room
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form room category from the configuration
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Items in this room, in snapshot order
    pub fn items(&self) -> &[Arc<Item>] {
        &self.items
    }
}

impl std::fmt::Display for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {} items", self.name, self.kind, self.items.len())
    }
}

/// The full set of rooms and items from one configuration snapshot
///
/// Built fully off to the side and swapped in as a whole on reload, so a
/// registry observed by callers is never partially constructed.
#[derive(Default)]
pub struct Home {
    rooms: Vec<Room>,
    items: HashMap<String, Arc<Item>>,
    by_type: HashMap<String, Vec<Arc<Item>>>,
    by_gui_type: HashMap<String, Vec<Arc<Item>>>,
}

impl Home {
    /// Build a registry from a `get_home` payload
    ///
    /// Malformed item records (missing id, duplicate id, or a snapshot
    /// state the type's translator rejects) are skipped with a warning;
    /// they never fail the whole load.
    pub(crate) fn from_payload(payload: HomePayload, conn: &Arc<Connection>) -> Self {
        let mut home = Home::default();
        for room_data in payload.home {
            let mut room = Room {
                name: room_data.name,
                kind: room_data.kind,
                items: Vec::new(),
            };
            for item_data in room_data.items {
                if item_data.id.is_empty() {
                    tracing::warn!("Skipping item without id in room {}", room.name);
                    continue;
                }
                if home.items.contains_key(&item_data.id) {
                    tracing::warn!("Skipping duplicate item id {}", item_data.id);
                    continue;
                }
                let item = match Item::from_data(item_data, &room.name, conn.clone()) {
                    Ok(item) => Arc::new(item),
                    Err(e) => {
                        tracing::warn!("Skipping item with untranslatable state: {}", e);
                        continue;
                    }
                };
                home.items.insert(item.id().to_string(), item.clone());
                home.by_type
                    .entry(item.item_type().to_string())
                    .or_default()
                    .push(item.clone());
                home.by_gui_type
                    .entry(item.gui_type().to_string())
                    .or_default()
                    .push(item.clone());
                room.items.push(item);
            }
            home.rooms.push(room);
        }
        home
    }

    /// Rooms in snapshot order
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Look up an item by id
    pub fn item(&self, id: &str) -> Option<&Arc<Item>> {
        self.items.get(id)
    }

    /// Iterate over all items
    pub fn items(&self) -> impl Iterator<Item = &Arc<Item>> {
        self.items.values()
    }

    /// Number of items in the registry
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the registry holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items declaring the given wire type
    pub fn items_by_type(&self, item_type: &str) -> &[Arc<Item>] {
        self.by_type.get(item_type).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Wire types present in this installation
    pub fn item_types(&self) -> Vec<&str> {
        self.by_type.keys().map(String::as_str).collect()
    }

    /// Items declaring the given GUI type
    pub fn items_by_gui_type(&self, gui_type: &str) -> &[Arc<Item>] {
        self.by_gui_type
            .get(gui_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// GUI types present in this installation
    pub fn item_gui_types(&self) -> Vec<&str> {
        self.by_gui_type.keys().map(String::as_str).collect()
    }

    pub(crate) fn item_ids(&self) -> Vec<String> {
        self.items.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn load(home: serde_json::Value) -> Home {
        let conn = Arc::new(Connection::new("http://127.0.0.1:1", "user", "pass").unwrap());
        let payload: HomePayload = serde_json::from_value(home).unwrap();
        Home::from_payload(payload, &conn)
    }

    #[test]
    fn builds_lookup_maps_in_snapshot_order() {
        let home = load(json!({"home": [
            {"name": "Salon", "type": "lounge", "items": [
                {"id": "a", "name": "Lamp", "type": "WODigital", "io_type": "output",
                 "gui_type": "light", "visible": "true", "state": "false"},
                {"id": "b", "name": "Dimmer", "type": "WODali", "io_type": "output",
                 "gui_type": "light_dimmer", "visible": "true", "state": "30"},
            ]},
            {"name": "Couloir", "type": "corridor", "items": [
                {"id": "c", "name": "Spot", "type": "WODigital", "io_type": "output",
                 "gui_type": "light", "visible": "false", "state": "true"},
            ]},
        ]}));

        assert_eq!(home.rooms().len(), 2);
        assert_eq!(home.rooms()[0].name(), "Salon");
        assert_eq!(home.rooms()[0].items().len(), 2);
        assert_eq!(home.len(), 3);
        assert_eq!(home.item("b").unwrap().room(), "Salon");
        assert_eq!(home.items_by_type("WODigital").len(), 2);
        assert_eq!(home.items_by_type("WOVoletSmart").len(), 0);
        assert_eq!(home.items_by_gui_type("light_dimmer").len(), 1);
    }

    #[test]
    fn malformed_records_are_skipped_not_fatal() {
        let home = load(json!({"home": [
            {"name": "Salon", "type": "lounge", "items": [
                {"name": "No id", "type": "WODigital", "io_type": "output", "state": "true"},
                {"id": "bad", "type": "WIDigitalTriple", "io_type": "input", "state": "12"},
                {"id": "ok", "type": "WODigital", "io_type": "output", "state": "true"},
            ]},
        ]}));

        assert_eq!(home.len(), 1);
        assert!(home.item("ok").is_some());
        assert!(home.item("bad").is_none());
    }
}
