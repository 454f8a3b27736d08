//! Persistence Tests
//!
//! Tests for:
//! - AnimationSet save / load fidelity
//! - Bundles of several sets
//! - Rejection of truncated and malformed streams

use glam::{Quat, Vec3};

use bonemix::{AnimationSet, BoneHash, BonemixError, load_bundle, save_bundle};

fn h(name: &str) -> BoneHash {
    BoneHash::from_name(name)
}

fn walk_set() -> anyhow::Result<AnimationSet> {
    let mut set = AnimationSet::new("characters/hero.fbx", "walk", 48.0, 24.0);
    set.add_bone_output(
        vec![h("root"), h("hips")],
        vec![0.0, 48.0],
        vec![Vec3::ONE, Vec3::new(1.0, 1.1, 1.0)],
        vec![0.0, 12.5, 48.0],
        vec![
            Quat::IDENTITY,
            Quat::from_rotation_y(0.7),
            Quat::from_xyzw(0.1, 0.2, 0.3, 0.9).normalize(),
        ],
        vec![0.0, 24.0, 48.0],
        vec![Vec3::ZERO, Vec3::new(0.0, 0.05, 1.0), Vec3::new(0.0, 0.0, 2.0)],
    )?;
    set.add_bone_output(
        vec![h("root"), h("hips"), h("spine")],
        vec![],
        vec![],
        vec![3.0],
        vec![Quat::from_rotation_x(-0.25)],
        vec![],
        vec![],
    )?;
    Ok(set)
}

// ============================================================================
// Round Trips
// ============================================================================

#[test]
fn save_load_preserves_every_float() -> anyhow::Result<()> {
    let set = walk_set()?;
    let mut bytes = Vec::new();
    set.save(&mut bytes)?;

    let loaded = AnimationSet::load(&mut bytes.as_slice())?;
    assert_eq!(loaded, set);
    assert_eq!(loaded.file_name(), "characters/hero.fbx");
    assert_eq!(loaded.bones_hierarchy()[1], vec![h("root"), h("hips"), h("spine")]);

    for (a, b) in loaded.bone_outputs().iter().zip(set.bone_outputs()) {
        let bits = |v: &[Quat]| {
            v.iter()
                .flat_map(|q| q.to_array())
                .map(f32::to_bits)
                .collect::<Vec<_>>()
        };
        assert_eq!(bits(a.rotation().values()), bits(b.rotation().values()));
    }

    let mut again = Vec::new();
    loaded.save(&mut again)?;
    assert_eq!(again, bytes);
    Ok(())
}

#[test]
fn bundle_round_trip_keeps_order() -> anyhow::Result<()> {
    let walk = walk_set()?;
    let idle = AnimationSet::new("characters/hero.fbx", "idle", 0.0, 30.0);

    let mut bytes = Vec::new();
    save_bundle(&mut bytes, &[walk.clone(), idle.clone()])?;
    assert_eq!(&bytes[..4], &2u32.to_le_bytes());

    let sets = load_bundle(&mut bytes.as_slice())?;
    assert_eq!(sets, vec![walk, idle]);
    Ok(())
}

#[test]
fn empty_bundle_loads_as_empty() -> anyhow::Result<()> {
    let mut bytes = Vec::new();
    save_bundle(&mut bytes, &[])?;
    assert_eq!(bytes, 0u32.to_le_bytes());
    assert!(load_bundle(&mut bytes.as_slice())?.is_empty());
    Ok(())
}

// ============================================================================
// Malformed Input
// ============================================================================

#[test]
fn truncated_stream_is_rejected() -> anyhow::Result<()> {
    let mut bytes = Vec::new();
    walk_set()?.save(&mut bytes)?;

    for cut in [0, 3, bytes.len() / 2, bytes.len() - 1] {
        let err = AnimationSet::load(&mut &bytes[..cut]).unwrap_err();
        assert!(matches!(err, BonemixError::Truncated), "cut at {cut}: {err}");
    }
    Ok(())
}

/// Hand-encoded set with a single scale curve.
fn encode_with_scale_times(times: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for name in ["f", "a"] {
        bytes.extend_from_slice(&(name.len() as u32).to_le_bytes());
        bytes.extend_from_slice(name.as_bytes());
    }
    bytes.extend_from_slice(&1.0f32.to_le_bytes());
    bytes.extend_from_slice(&1.0f32.to_le_bytes());
    // one bone output, hierarchy [bone]
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&h("bone").raw().to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&h("bone").raw().to_le_bytes());
    // scale curve
    bytes.extend_from_slice(&(times.len() as u32).to_le_bytes());
    for t in times {
        bytes.extend_from_slice(&t.to_le_bytes());
    }
    for _ in times {
        for c in [1.0f32; 3] {
            bytes.extend_from_slice(&c.to_le_bytes());
        }
    }
    // empty rotation and translation curves
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes
}

#[test]
fn hand_encoded_set_loads() -> anyhow::Result<()> {
    let set = AnimationSet::load(&mut encode_with_scale_times(&[0.0, 0.5]).as_slice())?;
    assert_eq!(set.name(), "a");
    assert_eq!(set.bone_outputs()[0].bone(), h("bone"));
    assert_eq!(set.bone_outputs()[0].scale().times(), &[0.0, 0.5]);
    Ok(())
}

#[test]
fn unsorted_key_times_are_rejected() {
    let bytes = encode_with_scale_times(&[1.0, 0.5]);
    let err = AnimationSet::load(&mut bytes.as_slice()).unwrap_err();
    assert!(matches!(
        err,
        BonemixError::UnsortedKeyTimes { curve: "scale", index: 1 }
    ));
}

#[test]
fn empty_hierarchy_is_rejected() {
    let mut bytes = encode_with_scale_times(&[]);
    // Hierarchy length sits after names (2 * 5), floats (8), count (4), bone hash (4)
    bytes[26..30].copy_from_slice(&0u32.to_le_bytes());
    let err = AnimationSet::load(&mut bytes.as_slice()).unwrap_err();
    assert!(matches!(err, BonemixError::EmptyHierarchy));
}
