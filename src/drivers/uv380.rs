// TYT MD-UV380 codeplug layout
// Dual-band variant of the MD-380 tables: larger channel and contact arrays,
// transmit frequency held as an offset, 64-member zones spilling into an extension

use super::md380;
use crate::schema::{Band, Extension, FieldTypeDescriptor, ModelSchema, ValueKind};

pub const MODEL: &str = "UV380";

crate::register_model!(MODEL, schema);

pub const MEMSIZE: usize = 0xD0000;

/// Zone members 17..64 live in this table, 96 bytes per zone
pub const ZONE_EXTENSION: Extension = Extension {
    offset: 0x31000,
    stride: 96,
    index: 16,
};

fn dual_band() -> Vec<Band> {
    vec![Band::mhz(136, 174), Band::mhz(400, 480)]
}

pub fn schema() -> ModelSchema {
    let zone_members = md380::zone_members().repeat(64).extension(ZONE_EXTENSION);
    let tx = FieldTypeDescriptor::new(
        "TxFrequencyOffset",
        160,
        32,
        ValueKind::FrequencyOffset {
            base: "RxFrequency".to_string(),
            bands: dual_band(),
        },
    );

    ModelSchema {
        vendor: "TYT".to_string(),
        model: MODEL.to_string(),
        description: "MD-UV380 VHF/UHF DMR handheld".to_string(),
        buffer_size: MEMSIZE,
        fill: 0xFF,
        device_range: Some((0x2000, MEMSIZE - 0x2000)),
        layouts: md380::layouts(MEMSIZE),
        record_types: vec![
            md380::general_settings(),
            md380::text_messages(),
            md380::contacts(0x70000, 10000),
            md380::group_lists(),
            md380::zones(zone_members),
            md380::scan_lists(),
            md380::channels(0x40000, 3000, dual_band(), tx),
        ],
    }
}
