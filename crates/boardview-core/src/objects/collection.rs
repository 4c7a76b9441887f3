//! Keyed collection of board objects with change notifications.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};

use super::{BoardObject, ObjectId, ShapeData};

/// All objects on the board, keyed by id.
///
/// Every mutation through this type bumps a revision number that is sent to
/// subscribers, so a renderer can re-export shapes only when needed.
#[derive(Debug, Default)]
pub struct BoardObjects {
    by_id: HashMap<ObjectId, BoardObject>,
    /// Insertion order, used to break z-index ties.
    insertion: Vec<ObjectId>,
    revision: u64,
    subscribers: Vec<Sender<u64>>,
}

impl BoardObjects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, id: &str) -> Option<&BoardObject> {
        self.by_id.get(id)
    }

    /// Insert or replace an object. A replaced object keeps its tie-break slot.
    pub fn insert(&mut self, object: impl Into<BoardObject>) {
        let object = object.into();
        let id = object.id().to_string();
        if self.by_id.insert(id.clone(), object).is_none() {
            self.insertion.push(id);
        }
        self.changed();
    }

    pub fn remove(&mut self, id: &str) -> Option<BoardObject> {
        let removed = self.by_id.remove(id)?;
        self.insertion.retain(|existing| existing != id);
        self.changed();
        Some(removed)
    }

    /// Mutate one object in place. Returns false if the id is unknown.
    pub fn update(&mut self, id: &str, f: impl FnOnce(&mut BoardObject)) -> bool {
        match self.by_id.get_mut(id) {
            Some(object) => {
                f(object);
                self.changed();
                true
            }
            None => false,
        }
    }

    /// Replace the whole collection in one step.
    pub fn replace_all(&mut self, objects: impl IntoIterator<Item = BoardObject>) {
        self.by_id.clear();
        self.insertion.clear();
        for object in objects {
            let id = object.id().to_string();
            if self.by_id.insert(id.clone(), object).is_none() {
                self.insertion.push(id);
            }
        }
        self.changed();
    }

    /// Objects in paint order: ascending z-index, ties by insertion order.
    pub fn items(&self) -> Vec<&BoardObject> {
        let mut items: Vec<&BoardObject> = self
            .insertion
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .collect();
        items.sort_by_key(|object| object.z_index());
        items
    }

    /// Renderer snapshot of every object, in paint order.
    pub fn transferable_data(&self) -> Vec<ShapeData> {
        self.items()
            .into_iter()
            .map(BoardObject::transferable_data)
            .collect()
    }

    /// Receive the revision number after every mutation.
    pub fn subscribe(&mut self) -> Receiver<u64> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn changed(&mut self) {
        self.revision += 1;
        let revision = self.revision;
        self.subscribers
            .retain(|subscriber| subscriber.send(revision).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::Rectangle;
    use kurbo::Point;

    fn rect(id: &str, z_index: i64) -> Rectangle {
        Rectangle::new(Point::ZERO, 10.0, 10.0)
            .with_id(id)
            .with_z_index(z_index)
    }

    #[test]
    fn test_items_sorted_by_z_index_stably() {
        let mut objects = BoardObjects::new();
        objects.insert(rect("c", 2));
        objects.insert(rect("a", 1));
        objects.insert(rect("b", 1));
        objects.insert(rect("z", 0));

        let ids: Vec<&str> = objects.items().iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec!["z", "a", "b", "c"]);
    }

    #[test]
    fn test_replace_keeps_slot() {
        let mut objects = BoardObjects::new();
        objects.insert(rect("a", 0));
        objects.insert(rect("b", 0));
        objects.insert(rect("a", 0));
        let ids: Vec<&str> = objects.items().iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(objects.len(), 2);
    }

    #[test]
    fn test_mutations_notify() {
        let mut objects = BoardObjects::new();
        let rx = objects.subscribe();
        objects.insert(rect("a", 0));
        assert!(objects.update("a", |o| o.base_mut().set_angle(45.0)));
        assert!(!objects.update("missing", |_| {}));
        objects.remove("a");
        assert!(objects.remove("a").is_none());

        let revisions: Vec<u64> = rx.try_iter().collect();
        assert_eq!(revisions, vec![1, 2, 3]);
    }

    #[test]
    fn test_update_invalidates_bounds() {
        let mut objects = BoardObjects::new();
        objects.insert(Rectangle::new(Point::ZERO, 10.0, 10.0).with_id("a").with_stroke_width(0.0));
        let before = objects.get("a").map(|o| o.bounds());
        objects.update("a", |o| o.base_mut().set_coords(100.0, 0.0));
        let after = objects.get("a").map(|o| o.bounds());
        assert_ne!(before, after);
        assert_eq!(after.map(|b| b.left), Some(100.0));
    }

    #[test]
    fn test_transferable_data_in_paint_order() {
        let mut objects = BoardObjects::new();
        objects.replace_all(vec![rect("top", 5).into(), rect("bottom", -1).into()]);
        let data = objects.transferable_data();
        assert_eq!(data[0].id(), "bottom");
        assert_eq!(data[1].id(), "top");
    }
}
