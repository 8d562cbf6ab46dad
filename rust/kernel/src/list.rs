// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ordered per-kind element collections with selection tracking.
//!
//! An [`ElementList`] owns the arena of one element kind together with
//! everything that is per-kind rather than per-element: the insertion order
//! (with holes reused through a freelist), the selection set, the active
//! element and the kind's [`CustomData`] registry. Layer edits go through the
//! list so that the slot change reaches every element it owns.

use std::ops::{Index, IndexMut};

use rustc_hash::FxHashSet;
use slotmap::{Key, SecondaryMap, SlotMap};

use crate::attr::{AttrType, AttrValue};
use crate::customdata::{CustomData, LayerChange};
use crate::eid::Eid;
use crate::elements::{ElemHeader, Element};
use crate::error::{Error, Result};
use crate::flags::{ElemFlags, LayerFlags};

/// Arena plus ordering, selection and custom data for one element kind.
#[derive(Debug, Clone)]
pub struct ElementList<K: Key, T> {
    items: SlotMap<K, T>,
    order: Vec<Option<K>>,
    slots: SecondaryMap<K, usize>,
    freelist: Vec<usize>,
    selected: FxHashSet<K>,
    active: Option<K>,
    customdata: CustomData,
}

impl<K: Key, T: Element> Default for ElementList<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, T: Element> ElementList<K, T> {
    pub fn new() -> Self {
        Self {
            items: SlotMap::with_key(),
            order: Vec::new(),
            slots: SecondaryMap::new(),
            freelist: Vec::new(),
            selected: FxHashSet::default(),
            active: None,
            customdata: CustomData::new(T::TYPE),
        }
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if `key` refers to a live element.
    pub fn contains(&self, key: K) -> bool {
        self.items.contains_key(key)
    }

    pub fn get(&self, key: K) -> Option<&T> {
        self.items.get(key)
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        self.items.get_mut(key)
    }

    /// Live elements in insertion order (freed positions are reused).
    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> + '_ {
        self.order
            .iter()
            .filter_map(move |k| k.and_then(|k| self.items.get(k).map(|t| (k, t))))
    }

    /// Keys of live elements in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.order.iter().filter_map(|k| *k)
    }

    /// Header for a new element of this kind with default attributes.
    pub fn new_header(&self, eid: Eid) -> ElemHeader {
        ElemHeader::new(eid, self.customdata.init_attrs())
    }

    /// Appends an element. A set `SELECT` flag adds it to the selection.
    pub fn push(&mut self, item: T) -> K {
        let selected = item.head().flag.contains(ElemFlags::SELECT);
        let key = self.items.insert(item);

        let slot = match self.freelist.pop() {
            Some(slot) => {
                self.order[slot] = Some(key);
                slot
            }
            None => {
                self.order.push(Some(key));
                self.order.len() - 1
            }
        };
        self.slots.insert(key, slot);

        if selected {
            self.selected.insert(key);
        }
        key
    }

    /// Removes an element and returns it with its eid set to [`Eid::FREED`].
    pub(crate) fn remove(&mut self, key: K) -> Option<T> {
        let mut item = self.items.remove(key)?;
        if let Some(slot) = self.slots.remove(key) {
            self.order[slot] = None;
            self.freelist.push(slot);
        }
        self.selected.remove(&key);
        if self.active == Some(key) {
            self.active = None;
        }
        item.head_mut().eid = Eid::FREED;
        Some(item)
    }

    // --- Selection ---

    /// Sets or clears the `SELECT` flag and keeps the selection set in step.
    pub fn set_select(&mut self, key: K, state: bool) {
        let Some(item) = self.items.get_mut(key) else {
            return;
        };
        item.head_mut().flag.set(ElemFlags::SELECT, state);
        if state {
            self.selected.insert(key);
        } else {
            self.selected.remove(&key);
        }
    }

    pub fn is_selected(&self, key: K) -> bool {
        self.selected.contains(&key)
    }

    pub fn select_all(&mut self) {
        for (key, item) in self.items.iter_mut() {
            item.head_mut().flag.insert(ElemFlags::SELECT);
            self.selected.insert(key);
        }
    }

    pub fn select_none(&mut self) {
        for item in self.items.values_mut() {
            item.head_mut().flag.remove(ElemFlags::SELECT);
        }
        self.selected.clear();
    }

    /// Selected keys in insertion order.
    pub fn selected(&self) -> impl Iterator<Item = K> + '_ {
        self.keys().filter(move |k| self.selected.contains(k))
    }

    pub fn selected_len(&self) -> usize {
        self.selected.len()
    }

    /// Sets the active element. Stale keys clear it.
    pub fn set_active(&mut self, key: Option<K>) {
        self.active = key.filter(|k| self.items.contains_key(*k));
    }

    pub fn active(&self) -> Option<K> {
        self.active
    }

    // --- Ordering ---

    /// Writes each element's dense position into its header.
    pub fn update_indices(&mut self) {
        let mut i = 0;
        for key in self.order.iter().flatten() {
            if let Some(item) = self.items.get_mut(*key) {
                item.head_mut().index = i;
                i += 1;
            }
        }
    }

    /// Drops the holes left by removed elements from the insertion order.
    pub fn compact(&mut self) {
        self.order.retain(|k| k.is_some());
        self.freelist.clear();
        for (slot, key) in self.order.iter().enumerate() {
            if let Some(key) = key {
                self.slots.insert(*key, slot);
            }
        }
    }

    // --- Custom data ---

    pub fn customdata(&self) -> &CustomData {
        &self.customdata
    }

    /// Adds a layer and a default value in the new slot of every element.
    pub fn add_layer(&mut self, ty: AttrType, name: Option<&str>) -> Result<u32> {
        let (id, change) = self.customdata.add_layer(ty, name)?;
        self.apply_layer_change(change);
        Ok(id)
    }

    /// Removes a layer and its slot from every element.
    pub fn rem_layer(&mut self, id: u32) -> Result<()> {
        let change = self.customdata.rem_layer(id)?;
        self.apply_layer_change(change);
        Ok(())
    }

    /// Removes every layer flagged `TEMPORARY`. Returns how many went.
    pub fn strip_temp_layers(&mut self) -> usize {
        let ids = self.customdata.temp_layers();
        for &id in &ids {
            if let Ok(change) = self.customdata.rem_layer(id) {
                self.apply_layer_change(change);
            }
        }
        ids.len()
    }

    /// Sets or clears behavior flags on layer `id`.
    pub fn set_layer_flag(&mut self, id: u32, flag: LayerFlags, state: bool) -> Result<()> {
        let layer = self
            .customdata
            .layer_mut(id)
            .ok_or_else(|| Error::LayerNotFound(id.to_string()))?;
        layer.flag.set(flag, state);
        Ok(())
    }

    pub fn set_active_layer(&mut self, id: u32) -> Result<()> {
        self.customdata.set_active_layer(id)
    }

    /// Slot of the active layer of `ty`; see [`CustomData::layer_index`].
    pub fn layer_index(&mut self, ty: AttrType) -> Option<usize> {
        self.customdata.layer_index(ty)
    }

    fn apply_layer_change(&mut self, change: LayerChange) {
        match change {
            LayerChange::Added { index, ty } => {
                for item in self.items.values_mut() {
                    let attrs = &mut item.head_mut().attrs;
                    let at = index.min(attrs.len());
                    attrs.insert(at, AttrValue::default_for(ty));
                }
            }
            LayerChange::Removed { index } => {
                for item in self.items.values_mut() {
                    let attrs = &mut item.head_mut().attrs;
                    if index < attrs.len() {
                        attrs.remove(index);
                    }
                }
            }
        }
    }

    /// Value of layer `id` on element `key`.
    pub fn attr(&self, key: K, id: u32) -> Option<&AttrValue> {
        let index = self.customdata.layer(id)?.index;
        self.items.get(key)?.head().attrs.get(index)
    }

    /// Replaces the value of layer `id` on element `key`.
    pub fn set_attr(&mut self, key: K, id: u32, value: AttrValue) -> Result<()> {
        let layer = self
            .customdata
            .layer(id)
            .ok_or_else(|| Error::LayerNotFound(id.to_string()))?;
        if layer.ty != value.attr_type() {
            return Err(Error::InvalidLayerType {
                ty: value.attr_type(),
                kind: T::TYPE,
            });
        }
        let index = layer.index;
        if let Some(slot) = self
            .items
            .get_mut(key)
            .and_then(|item| item.head_mut().attrs.get_mut(index))
        {
            *slot = value;
        }
        Ok(())
    }

    /// Blends the attributes of `sources` into `dest`, honoring layer flags.
    pub fn interp_attrs(&mut self, dest: K, sources: &[K], weights: &[f64]) {
        let src: Vec<Vec<AttrValue>> = sources
            .iter()
            .filter_map(|k| self.items.get(*k).map(|t| t.head().attrs.clone()))
            .collect();
        let src_refs: Vec<&[AttrValue]> = src.iter().map(|a| a.as_slice()).collect();

        if let Some(item) = self.items.get_mut(dest) {
            self.customdata
                .interp(&mut item.head_mut().attrs, &src_refs, weights);
        }
    }

    /// Copies every attribute of `src` onto `dest`.
    pub fn copy_attrs(&mut self, dest: K, src: K) {
        if dest == src {
            return;
        }
        let Some(attrs) = self.items.get(src).map(|t| t.head().attrs.clone()) else {
            return;
        };
        if let Some(item) = self.items.get_mut(dest) {
            for (d, s) in item.head_mut().attrs.iter_mut().zip(&attrs) {
                d.copy_from(s);
            }
        }
    }

    /// Installs a registry loaded from a snapshot. Only valid while empty.
    pub(crate) fn replace_customdata(&mut self, customdata: CustomData) {
        debug_assert!(self.items.is_empty());
        self.customdata = customdata;
    }
}

impl<K: Key, T> Index<K> for ElementList<K, T> {
    type Output = T;

    fn index(&self, key: K) -> &T {
        &self.items[key]
    }
}

impl<K: Key, T> IndexMut<K> for ElementList<K, T> {
    fn index_mut(&mut self, key: K) -> &mut T {
        &mut self.items[key]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Vertex;
    use crate::keys::VertexKey;
    use nalgebra::{Point3, Vector3};
    use smallvec::SmallVec;

    fn vert(list: &ElementList<VertexKey, Vertex>, eid: i64) -> Vertex {
        Vertex {
            head: list.new_header(Eid(eid)),
            co: Point3::origin(),
            no: Vector3::z(),
            edges: SmallVec::new(),
        }
    }

    #[test]
    fn push_and_iterate_in_order() {
        let mut list: ElementList<VertexKey, Vertex> = ElementList::new();
        let a = list.push(vert(&list, 0));
        let b = list.push(vert(&list, 1));
        let c = list.push(vert(&list, 2));

        let keys: Vec<_> = list.keys().collect();
        assert_eq!(keys, vec![a, b, c]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn removed_slot_is_reused() {
        let mut list: ElementList<VertexKey, Vertex> = ElementList::new();
        let a = list.push(vert(&list, 0));
        let b = list.push(vert(&list, 1));
        let c = list.push(vert(&list, 2));

        let freed = list.remove(b).unwrap();
        assert_eq!(freed.head.eid, Eid::FREED);
        assert!(!list.contains(b));

        let d = list.push(vert(&list, 3));
        let keys: Vec<_> = list.keys().collect();
        assert_eq!(keys, vec![a, d, c]);
    }

    #[test]
    fn compact_drops_holes() {
        let mut list: ElementList<VertexKey, Vertex> = ElementList::new();
        let a = list.push(vert(&list, 0));
        let b = list.push(vert(&list, 1));
        let c = list.push(vert(&list, 2));
        list.remove(a);
        list.compact();
        list.update_indices();

        assert_eq!(list[b].head.index, 0);
        assert_eq!(list[c].head.index, 1);
        let d = list.push(vert(&list, 3));
        assert_eq!(list.keys().last(), Some(d));
    }

    #[test]
    fn selection_follows_flags() {
        let mut list: ElementList<VertexKey, Vertex> = ElementList::new();
        let mut v = vert(&list, 0);
        v.head.flag |= ElemFlags::SELECT;
        let a = list.push(v);
        let b = list.push(vert(&list, 1));

        assert!(list.is_selected(a));
        assert!(!list.is_selected(b));

        list.set_select(b, true);
        assert_eq!(list.selected().collect::<Vec<_>>(), vec![a, b]);

        list.remove(a);
        assert_eq!(list.selected_len(), 1);

        list.select_none();
        assert_eq!(list.selected_len(), 0);
        assert!(!list[b].head.flag.contains(ElemFlags::SELECT));

        list.select_all();
        assert!(list.is_selected(b));
    }

    #[test]
    fn active_is_cleared_on_remove() {
        let mut list: ElementList<VertexKey, Vertex> = ElementList::new();
        let a = list.push(vert(&list, 0));
        list.set_active(Some(a));
        assert_eq!(list.active(), Some(a));
        list.remove(a);
        assert_eq!(list.active(), None);
    }

    #[test]
    fn layer_changes_reach_every_element() {
        let mut list: ElementList<VertexKey, Vertex> = ElementList::new();
        let keys: Vec<_> = (0..10).map(|i| list.push(vert(&list, i))).collect();

        let id = list.add_layer(AttrType::Color, Some("color")).unwrap();
        assert!(keys.iter().all(|k| list[*k].head.attrs.len() == 1));

        list.rem_layer(id).unwrap();
        assert!(keys.iter().all(|k| list[*k].head.attrs.is_empty()));
    }

    #[test]
    fn set_attr_checks_kind() {
        let mut list: ElementList<VertexKey, Vertex> = ElementList::new();
        let a = list.push(vert(&list, 0));
        let id = list.add_layer(AttrType::Float, None).unwrap();

        list.set_attr(a, id, AttrValue::Float(2.5)).unwrap();
        assert_eq!(list.attr(a, id), Some(&AttrValue::Float(2.5)));
        assert!(list.set_attr(a, id, AttrValue::Int(1)).is_err());
    }

    #[test]
    fn strip_temp_layers_keeps_others() {
        let mut list: ElementList<VertexKey, Vertex> = ElementList::new();
        let a = list.push(vert(&list, 0));
        let keep = list.add_layer(AttrType::Float, None).unwrap();
        let mask = list.add_layer(AttrType::Mask, None).unwrap();
        let int = list.add_layer(AttrType::Int, None).unwrap();
        list.set_layer_flag(mask, LayerFlags::TEMPORARY, true).unwrap();
        list.set_layer_flag(int, LayerFlags::TEMPORARY, true).unwrap();

        assert_eq!(list.strip_temp_layers(), 2);
        assert_eq!(list[a].head.attrs.len(), 1);
        assert!(list.customdata().layer(keep).is_some());
        assert_eq!(list.customdata().layer(keep).unwrap().index, 0);
    }
}
