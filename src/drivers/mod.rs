// Radio model tables and device hooks
pub mod registry;
pub mod traits;

// Models
pub mod md380;
pub mod uv380;

#[cfg(test)]
pub mod mock;

pub use registry::{
    detect_model, get_model, list_models, list_models_by_vendor, prepare_model, ModelInfo,
};
pub use traits::{DeviceError, DeviceIo, DeviceResult, ProgressCallback, Status};

#[cfg(test)]
use crate::schema::ModelSchema;

/// Flip every field instance of the first and last record of each type and
/// check that exactly its own bits changed, and that no two fields, record
/// arrays or extension regions overlap
#[cfg(test)]
pub(crate) fn assert_bit_isolation(schema: &ModelSchema) {
    use crate::bitwise::{codec, max_for_bits};
    use crate::memmap::MemoryMap;

    let original = MemoryMap::new_filled(schema.buffer_size, 0xA5);
    let mut buf = original.clone();
    let mut regions = Vec::new();

    for rt in &schema.record_types {
        regions.push((rt.offset, rt.offset + rt.size * rt.max, rt.name.clone()));
        for ft in &rt.fields {
            if let Some(ext) = ft.extension {
                let name = format!("{}.{}", rt.name, ft.name);
                regions.push((ext.offset, ext.offset + ext.stride * rt.max, name));
            }
        }

        for record in [0, rt.max - 1] {
            let mut spans = Vec::new();
            for ft in &rt.fields {
                for repeat in 0..ft.max {
                    let loc = codec::locate(rt, record, ft, repeat).unwrap();
                    spans.push((loc.bit, loc.bit + loc.bits, format!("{}[{}]", ft.name, repeat)));

                    let before = codec::read(&buf, loc).unwrap();
                    let flipped: Vec<u8> = if loc.bits >= 8 {
                        before.iter().map(|b| !b).collect()
                    } else {
                        vec![!before[0] & max_for_bits(loc.bits) as u8]
                    };
                    codec::write(&mut buf, loc, &flipped).unwrap();

                    let lo = loc.byte().saturating_sub(8);
                    let hi = (loc.byte() + loc.byte_len() + 8).min(buf.len());
                    for pos in lo..hi {
                        let diff = buf.byte(pos).unwrap() ^ original.byte(pos).unwrap();
                        for bit in 0..8 {
                            let abs = pos * 8 + bit;
                            assert_eq!(
                                diff & (0x80 >> bit) != 0,
                                (loc.bit..loc.bit + loc.bits).contains(&abs),
                                "{}[{}].{}[{}] bit {}",
                                rt.name,
                                record,
                                ft.name,
                                repeat,
                                abs
                            );
                        }
                    }
                    codec::write(&mut buf, loc, &before).unwrap();
                }
            }
            spans.sort();
            for pair in spans.windows(2) {
                assert!(
                    pair[0].1 <= pair[1].0,
                    "{}: {} overlaps {}",
                    rt.name,
                    pair[0].2,
                    pair[1].2
                );
            }
        }
    }

    regions.sort();
    for pair in regions.windows(2) {
        assert!(pair[0].1 <= pair[1].0, "{} overlaps {}", pair[0].2, pair[1].2);
    }
    assert_eq!(buf, original);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_are_registered() {
        for model in [md380::MODEL, uv380::MODEL] {
            assert!(get_model(model).is_some(), "{} not registered", model);
        }
        assert_eq!(list_models_by_vendor()["TYT"].len(), 2);
    }
}
