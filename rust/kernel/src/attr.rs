// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Attribute value kinds that can be stored in custom data layers.
//!
//! The set of kinds is closed: [`AttrType`] names a kind and carries its
//! static description (which elements it attaches to, its default layer
//! name, its default layer flags), while [`AttrValue`] is one stored value
//! and implements the copy/clear/interpolate operations every kind supports.

use std::fmt;

use nalgebra::{Vector2, Vector3, Vector4};
use serde::{Deserialize, Serialize};

use crate::flags::{ElemTypeMask, LayerFlags};

/// A registered attribute kind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum AttrType {
    Uv,
    Vec2,
    Vec3,
    Vec4,
    Float,
    Int,
    Color,
    Normal,
    Mask,
    OrigIndex,
}

impl AttrType {
    /// Every registered kind.
    pub const ALL: [AttrType; 10] = [
        AttrType::Uv,
        AttrType::Vec2,
        AttrType::Vec3,
        AttrType::Vec4,
        AttrType::Float,
        AttrType::Int,
        AttrType::Color,
        AttrType::Normal,
        AttrType::Mask,
        AttrType::OrigIndex,
    ];

    /// Stable lowercase name of the kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrType::Uv => "uv",
            AttrType::Vec2 => "vec2",
            AttrType::Vec3 => "vec3",
            AttrType::Vec4 => "vec4",
            AttrType::Float => "float",
            AttrType::Int => "int",
            AttrType::Color => "color",
            AttrType::Normal => "normal",
            AttrType::Mask => "mask",
            AttrType::OrigIndex => "origindex",
        }
    }

    /// Name given to a new layer when the caller does not supply one.
    pub fn default_name(&self) -> &'static str {
        match self {
            AttrType::Uv => "UV Layer",
            AttrType::Vec2 => "Vector 2",
            AttrType::Vec3 => "Coordinates",
            AttrType::Vec4 => "Coordinates4",
            AttrType::Float => "Float Layer",
            AttrType::Int => "Int Layer",
            AttrType::Color => "Color",
            AttrType::Normal => "Normal Layer",
            AttrType::Mask => "Mask Layer",
            AttrType::OrigIndex => "Original Index",
        }
    }

    /// Element kinds a layer of this type may attach to.
    pub fn elem_mask(&self) -> ElemTypeMask {
        match self {
            AttrType::Uv | AttrType::Normal => ElemTypeMask::LOOP,
            AttrType::Vec2 | AttrType::Float | AttrType::Int => ElemTypeMask::all(),
            AttrType::Vec3 | AttrType::Vec4 | AttrType::Color => {
                ElemTypeMask::VERTEX | ElemTypeMask::LOOP
            }
            AttrType::Mask => ElemTypeMask::VERTEX,
            AttrType::OrigIndex => ElemTypeMask::VERTEX | ElemTypeMask::EDGE | ElemTypeMask::FACE,
        }
    }

    /// Flags a new layer of this type starts with.
    pub fn default_flags(&self) -> LayerFlags {
        match self {
            AttrType::OrigIndex => LayerFlags::NO_INTERP_COPY_ONLY,
            _ => LayerFlags::empty(),
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// One stored attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Uv(Vector2<f64>),
    Vec2(Vector2<f64>),
    Vec3(Vector3<f64>),
    Vec4(Vector4<f64>),
    Float(f64),
    Int(i64),
    Color(Vector4<f64>),
    Normal(Vector3<f64>),
    Mask(f64),
    OrigIndex(i64),
}

impl AttrValue {
    /// Default-constructed value of the given kind.
    pub fn default_for(ty: AttrType) -> Self {
        match ty {
            AttrType::Uv => AttrValue::Uv(Vector2::zeros()),
            AttrType::Vec2 => AttrValue::Vec2(Vector2::zeros()),
            AttrType::Vec3 => AttrValue::Vec3(Vector3::zeros()),
            AttrType::Vec4 => AttrValue::Vec4(Vector4::zeros()),
            AttrType::Float => AttrValue::Float(0.0),
            AttrType::Int => AttrValue::Int(0),
            AttrType::Color => AttrValue::Color(Vector4::new(1.0, 1.0, 1.0, 1.0)),
            AttrType::Normal => AttrValue::Normal(Vector3::z()),
            AttrType::Mask => AttrValue::Mask(1.0),
            AttrType::OrigIndex => AttrValue::OrigIndex(-1),
        }
    }

    /// The kind of this value.
    pub fn attr_type(&self) -> AttrType {
        match self {
            AttrValue::Uv(_) => AttrType::Uv,
            AttrValue::Vec2(_) => AttrType::Vec2,
            AttrValue::Vec3(_) => AttrType::Vec3,
            AttrValue::Vec4(_) => AttrType::Vec4,
            AttrValue::Float(_) => AttrType::Float,
            AttrValue::Int(_) => AttrType::Int,
            AttrValue::Color(_) => AttrType::Color,
            AttrValue::Normal(_) => AttrType::Normal,
            AttrValue::Mask(_) => AttrType::Mask,
            AttrValue::OrigIndex(_) => AttrType::OrigIndex,
        }
    }

    /// Copies `src` into `self`. Values of a different kind are ignored.
    pub fn copy_from(&mut self, src: &AttrValue) {
        if self.attr_type() == src.attr_type() {
            self.clone_from(src);
        }
    }

    /// Resets to the kind's default value.
    pub fn clear(&mut self) {
        *self = AttrValue::default_for(self.attr_type());
    }

    /// Writes the weighted blend of `sources` into `self`.
    ///
    /// Sources of a different kind than `self` are skipped. An empty source
    /// list leaves `self` unchanged. `Int` rounds the blended sum, `Normal`
    /// renormalizes it and `OrigIndex` takes the first source.
    pub fn interp(&mut self, sources: &[&AttrValue], weights: &[f64]) {
        if sources.is_empty() {
            return;
        }

        match self {
            AttrValue::Uv(dst) => {
                *dst = blend(sources, weights, Vector2::zeros(), |v| match v {
                    AttrValue::Uv(x) => Some(*x),
                    _ => None,
                })
            }
            AttrValue::Vec2(dst) => {
                *dst = blend(sources, weights, Vector2::zeros(), |v| match v {
                    AttrValue::Vec2(x) => Some(*x),
                    _ => None,
                })
            }
            AttrValue::Vec3(dst) => {
                *dst = blend(sources, weights, Vector3::zeros(), |v| match v {
                    AttrValue::Vec3(x) => Some(*x),
                    _ => None,
                })
            }
            AttrValue::Vec4(dst) => {
                *dst = blend(sources, weights, Vector4::zeros(), |v| match v {
                    AttrValue::Vec4(x) => Some(*x),
                    _ => None,
                })
            }
            AttrValue::Color(dst) => {
                *dst = blend(sources, weights, Vector4::zeros(), |v| match v {
                    AttrValue::Color(x) => Some(*x),
                    _ => None,
                })
            }
            AttrValue::Normal(dst) => {
                let sum = blend(sources, weights, Vector3::zeros(), |v| match v {
                    AttrValue::Normal(x) => Some(*x),
                    _ => None,
                });
                if let Some(n) = sum.try_normalize(1e-12) {
                    *dst = n;
                }
            }
            AttrValue::Float(dst) => {
                *dst = blend(sources, weights, 0.0, |v| match v {
                    AttrValue::Float(x) => Some(*x),
                    _ => None,
                })
            }
            AttrValue::Mask(dst) => {
                *dst = blend(sources, weights, 0.0, |v| match v {
                    AttrValue::Mask(x) => Some(*x),
                    _ => None,
                })
            }
            AttrValue::Int(dst) => {
                let sum = blend(sources, weights, 0.0, |v| match v {
                    AttrValue::Int(x) => Some(*x as f64),
                    _ => None,
                });
                *dst = (sum + 0.5).floor() as i64;
            }
            AttrValue::OrigIndex(dst) => {
                if let AttrValue::OrigIndex(first) = sources[0] {
                    *dst = *first;
                }
            }
        }
    }
}

/// Weighted sum over the sources that hold the expected kind.
fn blend<T, F>(sources: &[&AttrValue], weights: &[f64], zero: T, get: F) -> T
where
    T: std::ops::Add<Output = T> + std::ops::Mul<f64, Output = T> + Copy,
    F: Fn(&AttrValue) -> Option<T>,
{
    sources
        .iter()
        .zip(weights)
        .fold(zero, |acc, (v, &w)| match get(*v) {
            Some(x) => acc + x * w,
            None => acc,
        })
}
