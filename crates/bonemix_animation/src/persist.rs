//! Binary persistence of [`AnimationSet`]s.
//!
//! # Layout
//!
//! Every integer and float is **little-endian**. Fields appear in this order:
//!
//! | Field                    | Encoding                               |
//! |--------------------------|----------------------------------------|
//! | file name                | `u32` byte length + UTF-8 bytes        |
//! | animation name           | `u32` byte length + UTF-8 bytes        |
//! | duration (ticks)         | `f32`                                  |
//! | ticks per second         | `f32`                                  |
//! | bone output count        | `u32`                                  |
//! | per bone output:         |                                        |
//! | &nbsp; bone hash         | `u32`                                  |
//! | &nbsp; hierarchy path    | `u32` length + `u32` hashes            |
//! | &nbsp; scale curve       | `u32` length + `f32` times + `3×f32`   |
//! | &nbsp; rotation curve    | `u32` length + `f32` times + `4×f32`   |
//! | &nbsp; translation curve | `u32` length + `f32` times + `3×f32`   |
//!
//! Quaternions are stored as `x, y, z, w`. A bundle is a `u32` set count
//! followed by that many sets.

use std::io::{Read, Write};

use bonemix_core::{BoneHash, BonemixError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{Quat, Vec3};

use crate::curve::KeyframeCurve;
use crate::set::{AnimationSet, BoneOutputTrack};
use crate::values::Interpolatable;

const MAX_NAME_LEN: usize = 1 << 16;
const MAX_HIERARCHY_LEN: usize = 1 << 10;
const MAX_KEY_COUNT: usize = 1 << 24;
const MAX_BONE_OUTPUTS: usize = 1 << 16;
const MAX_BUNDLE_SETS: usize = 1 << 16;

/// Upper bound on speculative preallocation for lengths read from a stream.
const PREALLOC_LIMIT: usize = 4096;

trait KeyValue: Interpolatable {
    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()>;
    fn read_value<R: Read>(reader: &mut R) -> Result<Self>;
}

impl KeyValue for Vec3 {
    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        for c in self.to_array() {
            writer.write_f32::<LittleEndian>(c)?;
        }
        Ok(())
    }

    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Vec3::new(
            reader.read_f32::<LittleEndian>()?,
            reader.read_f32::<LittleEndian>()?,
            reader.read_f32::<LittleEndian>()?,
        ))
    }
}

impl KeyValue for Quat {
    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        for c in self.to_array() {
            writer.write_f32::<LittleEndian>(c)?;
        }
        Ok(())
    }

    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Quat::from_xyzw(
            reader.read_f32::<LittleEndian>()?,
            reader.read_f32::<LittleEndian>()?,
            reader.read_f32::<LittleEndian>()?,
            reader.read_f32::<LittleEndian>()?,
        ))
    }
}

fn write_len<W: Write>(writer: &mut W, len: usize, context: &'static str) -> Result<()> {
    let len32 = u32::try_from(len).map_err(|_| BonemixError::LengthOverflow {
        context,
        len,
        limit: u32::MAX as usize,
    })?;
    writer.write_u32::<LittleEndian>(len32)?;
    Ok(())
}

fn read_len<R: Read>(reader: &mut R, context: &'static str, limit: usize) -> Result<usize> {
    let len = reader.read_u32::<LittleEndian>()? as usize;
    if len > limit {
        return Err(BonemixError::LengthOverflow {
            context,
            len,
            limit,
        });
    }
    Ok(len)
}

fn write_string<W: Write>(writer: &mut W, value: &str, context: &'static str) -> Result<()> {
    write_len(writer, value.len(), context)?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}

fn read_string<R: Read>(reader: &mut R, context: &'static str) -> Result<String> {
    let len = read_len(reader, context, MAX_NAME_LEN)?;
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| BonemixError::InvalidUtf8(context))
}

fn write_curve<W: Write, T: KeyValue>(
    writer: &mut W,
    curve: &KeyframeCurve<T>,
    context: &'static str,
) -> Result<()> {
    write_len(writer, curve.len(), context)?;
    for &time in curve.times() {
        writer.write_f32::<LittleEndian>(time)?;
    }
    for value in curve.values() {
        value.write_value(writer)?;
    }
    Ok(())
}

fn read_curve<R: Read, T: KeyValue>(
    reader: &mut R,
    context: &'static str,
) -> Result<KeyframeCurve<T>> {
    let len = read_len(reader, context, MAX_KEY_COUNT)?;
    let mut times = Vec::with_capacity(len.min(PREALLOC_LIMIT));
    for _ in 0..len {
        times.push(reader.read_f32::<LittleEndian>()?);
    }
    let mut values = Vec::with_capacity(len.min(PREALLOC_LIMIT));
    for _ in 0..len {
        values.push(T::read_value(reader)?);
    }
    KeyframeCurve::new(context, times, values)
}

impl AnimationSet {
    /// Writes the set in the layout described in the [module docs](self).
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_string(writer, self.file_name(), "file name")?;
        write_string(writer, self.name(), "animation name")?;
        writer.write_f32::<LittleEndian>(self.duration())?;
        writer.write_f32::<LittleEndian>(self.ticks_per_second())?;

        write_len(writer, self.bone_output_count(), "bone outputs")?;
        for (track, hierarchy) in self.bone_outputs().iter().zip(self.bones_hierarchy()) {
            writer.write_u32::<LittleEndian>(track.bone().raw())?;
            write_len(writer, hierarchy.len(), "hierarchy")?;
            for hash in hierarchy {
                writer.write_u32::<LittleEndian>(hash.raw())?;
            }
            write_curve(writer, track.scale(), "scale")?;
            write_curve(writer, track.rotation(), "rotation")?;
            write_curve(writer, track.translation(), "translation")?;
        }
        Ok(())
    }

    /// Reads a set written by [`AnimationSet::save`].
    ///
    /// Any malformed field fails the whole load; no partially built set is
    /// ever returned.
    pub fn load<R: Read>(reader: &mut R) -> Result<Self> {
        let file_name = read_string(reader, "file name")?;
        let name = read_string(reader, "animation name")?;
        let duration = reader.read_f32::<LittleEndian>()?;
        let ticks_per_second = reader.read_f32::<LittleEndian>()?;
        let mut set = AnimationSet::new(file_name, name, duration, ticks_per_second);

        let count = read_len(reader, "bone outputs", MAX_BONE_OUTPUTS)?;
        for _ in 0..count {
            let bone = BoneHash::from_raw(reader.read_u32::<LittleEndian>()?);

            let depth = read_len(reader, "hierarchy", MAX_HIERARCHY_LEN)?;
            if depth == 0 {
                return Err(BonemixError::EmptyHierarchy);
            }
            let mut hierarchy = Vec::with_capacity(depth);
            for _ in 0..depth {
                hierarchy.push(BoneHash::from_raw(reader.read_u32::<LittleEndian>()?));
            }

            let scale = read_curve(reader, "scale")?;
            let rotation = read_curve(reader, "rotation")?;
            let translation = read_curve(reader, "translation")?;
            set.push_bone_output(
                hierarchy,
                BoneOutputTrack::new(bone, scale, rotation, translation),
            );
        }

        log::debug!(
            "Loaded animation set '{}' ({} bone outputs)",
            set.name(),
            set.bone_output_count()
        );
        Ok(set)
    }
}

/// Writes a `u32` set count followed by every set.
pub fn save_bundle<W: Write>(writer: &mut W, sets: &[AnimationSet]) -> Result<()> {
    write_len(writer, sets.len(), "bundle")?;
    for set in sets {
        set.save(writer)?;
    }
    Ok(())
}

/// Reads a bundle written by [`save_bundle`].
pub fn load_bundle<R: Read>(reader: &mut R) -> Result<Vec<AnimationSet>> {
    let count = read_len(reader, "bundle", MAX_BUNDLE_SETS)?;
    let mut sets = Vec::with_capacity(count.min(PREALLOC_LIMIT));
    for _ in 0..count {
        sets.push(AnimationSet::load(reader)?);
    }
    Ok(sets)
}
