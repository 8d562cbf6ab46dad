// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Custom data layer registry for one element kind.
//!
//! A [`CustomData`] owns the flat list of layers registered for a kind (the
//! position in that list is the attribute slot every element of the kind
//! uses) and one [`LayerSet`] per attribute type, which tracks the type's
//! layers and its active layer.
//!
//! The registry never touches elements itself. [`CustomData::add_layer`] and
//! [`CustomData::rem_layer`] return a [`LayerChange`] describing the slot that
//! appeared or disappeared, and the owning element collection applies that
//! change to every one of its elements before handing control back.

use serde::{Deserialize, Serialize};

use crate::attr::{AttrType, AttrValue};
use crate::error::{Error, Result};
use crate::flags::LayerFlags;
use crate::keys::ElemType;

/// One registered layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomDataLayer {
    pub ty: AttrType,
    pub name: String,
    /// Stable id, unique within the owning registry.
    pub id: u32,
    /// Attribute slot (position in the flat list).
    pub index: usize,
    pub flag: LayerFlags,
}

/// The layers of one attribute type, in creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSet {
    pub ty: AttrType,
    /// Layer ids.
    pub layers: Vec<u32>,
    /// Id of the active layer, if any.
    pub active: Option<u32>,
}

/// Slot change produced by adding or removing a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerChange {
    /// A new slot was appended at `index`.
    Added { index: usize, ty: AttrType },
    /// The slot at `index` was removed; later slots shift down by one.
    Removed { index: usize },
}

/// Layer registry for one element kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomData {
    kind: ElemType,
    flatlist: Vec<CustomDataLayer>,
    layersets: Vec<LayerSet>,
    next_id: u32,
}

impl CustomData {
    pub fn new(kind: ElemType) -> Self {
        Self {
            kind,
            flatlist: Vec::new(),
            layersets: Vec::new(),
            next_id: 0,
        }
    }

    /// Element kind this registry belongs to.
    pub fn kind(&self) -> ElemType {
        self.kind
    }

    /// All layers in slot order.
    pub fn layers(&self) -> &[CustomDataLayer] {
        &self.flatlist
    }

    /// Number of attribute slots every element of this kind carries.
    pub fn len(&self) -> usize {
        self.flatlist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flatlist.is_empty()
    }

    /// Looks up a layer by id.
    pub fn layer(&self, id: u32) -> Option<&CustomDataLayer> {
        self.flatlist.iter().find(|l| l.id == id)
    }

    /// Mutable layer lookup, for editing names and flags.
    pub fn layer_mut(&mut self, id: u32) -> Option<&mut CustomDataLayer> {
        self.flatlist.iter_mut().find(|l| l.id == id)
    }

    /// The layer set of an attribute type, if any layer of it was ever added.
    pub fn layer_set(&self, ty: AttrType) -> Option<&LayerSet> {
        self.layersets.iter().find(|s| s.ty == ty)
    }

    /// Returns true if at least one layer of `ty` exists.
    pub fn has_layer(&self, ty: AttrType) -> bool {
        self.layer_set(ty).is_some_and(|s| !s.layers.is_empty())
    }

    /// Looks up a layer by name and type.
    pub fn named_layer(&self, name: &str, ty: AttrType) -> Option<&CustomDataLayer> {
        self.flatlist.iter().find(|l| l.ty == ty && l.name == name)
    }

    /// The active layer of `ty`, if one is set.
    pub fn active_layer(&self, ty: AttrType) -> Option<&CustomDataLayer> {
        let id = self.layer_set(ty)?.active?;
        self.layer(id)
    }

    /// Makes the layer with `id` the active layer of its type.
    pub fn set_active_layer(&mut self, id: u32) -> Result<()> {
        let ty = self
            .layer(id)
            .map(|l| l.ty)
            .ok_or_else(|| Error::LayerNotFound(id.to_string()))?;
        let set = self.layer_set_mut(ty);
        set.active = Some(id);
        Ok(())
    }

    /// Slot of the active layer of `ty`.
    ///
    /// If layers of `ty` exist but none is active, the first one becomes
    /// active.
    pub fn layer_index(&mut self, ty: AttrType) -> Option<usize> {
        let set = self.layersets.iter_mut().find(|s| s.ty == ty)?;
        if set.active.is_none() {
            set.active = set.layers.first().copied();
        }
        let id = set.active?;
        self.layer(id).map(|l| l.index)
    }

    /// Registers a new layer and returns its id plus the slot change the
    /// caller must apply to every element of this kind.
    ///
    /// `name` defaults to the type's default name and is made unique by
    /// appending a counter (`Color`, `Color2`, `Color3`, ...).
    pub fn add_layer(&mut self, ty: AttrType, name: Option<&str>) -> Result<(u32, LayerChange)> {
        if !ty.elem_mask().contains(self.kind.mask()) {
            return Err(Error::InvalidLayerType { ty, kind: self.kind });
        }

        let name = self.unique_name(name.unwrap_or(ty.default_name()));
        let id = self.next_id;
        self.next_id += 1;

        let index = self.flatlist.len();
        self.flatlist.push(CustomDataLayer {
            ty,
            name,
            id,
            index,
            flag: ty.default_flags(),
        });
        self.layer_set_mut(ty).layers.push(id);

        Ok((id, LayerChange::Added { index, ty }))
    }

    /// Unregisters a layer and returns the slot change the caller must apply.
    ///
    /// If it was its type's active layer, the next layer of that type (if
    /// any) becomes active.
    pub fn rem_layer(&mut self, id: u32) -> Result<LayerChange> {
        let pos = self
            .flatlist
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| Error::LayerNotFound(id.to_string()))?;
        let layer = self.flatlist.remove(pos);

        let set = self.layer_set_mut(layer.ty);
        if let Some(i) = set.layers.iter().position(|&x| x == id) {
            if set.active == Some(id) {
                set.active = if set.layers.len() > 1 {
                    Some(set.layers[(i + 1) % set.layers.len()])
                } else {
                    None
                };
            }
            set.layers.remove(i);
        }

        for (i, l) in self.flatlist.iter_mut().enumerate() {
            l.index = i;
        }

        Ok(LayerChange::Removed { index: layer.index })
    }

    /// Default attribute array for a freshly created element.
    pub fn init_attrs(&self) -> Vec<AttrValue> {
        self.flatlist
            .iter()
            .map(|l| AttrValue::default_for(l.ty))
            .collect()
    }

    /// Ids of every layer flagged [`LayerFlags::TEMPORARY`].
    pub fn temp_layers(&self) -> Vec<u32> {
        self.flatlist
            .iter()
            .filter(|l| l.flag.contains(LayerFlags::TEMPORARY))
            .map(|l| l.id)
            .collect()
    }

    /// Blends `sources` into `dest` slot by slot, honoring layer flags.
    pub fn interp(&self, dest: &mut [AttrValue], sources: &[&[AttrValue]], weights: &[f64]) {
        for layer in &self.flatlist {
            if layer.flag.contains(LayerFlags::NO_INTERP) {
                continue;
            }
            let Some(slot) = dest.get_mut(layer.index) else {
                continue;
            };
            let srcs: Vec<&AttrValue> = sources
                .iter()
                .filter_map(|attrs| attrs.get(layer.index))
                .collect();

            if layer.flag.contains(LayerFlags::NO_INTERP_COPY_ONLY) {
                if let Some(first) = srcs.first() {
                    slot.copy_from(first);
                }
            } else {
                slot.interp(&srcs, weights);
            }
        }
    }

    fn layer_set_mut(&mut self, ty: AttrType) -> &mut LayerSet {
        let pos = match self.layersets.iter().position(|s| s.ty == ty) {
            Some(pos) => pos,
            None => {
                self.layersets.push(LayerSet {
                    ty,
                    layers: Vec::new(),
                    active: None,
                });
                self.layersets.len() - 1
            }
        };
        &mut self.layersets[pos]
    }

    fn unique_name(&self, name: &str) -> String {
        let taken = |n: &str| self.flatlist.iter().any(|l| l.name == n);
        let mut candidate = name.to_string();
        let mut i = 2;
        while taken(&candidate) {
            candidate = format!("{name}{i}");
            i += 1;
        }
        candidate
    }
}
