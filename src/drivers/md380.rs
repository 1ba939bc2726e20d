// TYT MD-380 codeplug layout
// UHF-only single-band handheld; the record tables here are shared with the MD-UV380

use crate::core::COLOR_CODES;
use crate::schema::{
    Band, FieldTypeDescriptor, FileKind, FileLayout, ModelSchema, RecordTypeDescriptor, SpanSpec,
    ValueKind,
};

pub const MODEL: &str = "MD380";

crate::register_model!(MODEL, schema);

/// Image size of the MD-380 codeplug
pub const MEMSIZE: usize = 0x40000;

/// CPS `.rdt` wrapper around the image
pub const RDT_HEADER: usize = 549;
pub const RDT_TRAILER: usize = 16;

pub(super) fn uhf() -> Vec<Band> {
    vec![Band::mhz(400, 480)]
}

pub(super) fn layouts(memsize: usize) -> Vec<FileLayout> {
    vec![
        FileLayout {
            kind: FileKind::Rdt,
            file_size: memsize + RDT_HEADER + RDT_TRAILER,
            header_size: RDT_HEADER,
            trailer_size: RDT_TRAILER,
        },
        FileLayout {
            kind: FileKind::Bin,
            file_size: memsize,
            header_size: 0,
            trailer_size: 0,
        },
    ]
}

fn text(name: &str, bit_offset: usize, chars: usize) -> FieldTypeDescriptor {
    FieldTypeDescriptor::new(name, bit_offset, chars * 16, ValueKind::Text)
}

fn flag(name: &str, bit_offset: usize) -> FieldTypeDescriptor {
    FieldTypeDescriptor::new(name, bit_offset, 1, ValueKind::OnOff)
}

pub(super) fn general_settings() -> RecordTypeDescriptor {
    RecordTypeDescriptor::new("GeneralSettings", 0x2040, 176, 1)
        .names(&["General Settings"])
        .field(text("InfoScreenLine1", 0, 10))
        .field(text("InfoScreenLine2", 160, 10))
        .field(flag("DisableAllLeds", 320))
        .field(
            FieldTypeDescriptor::new(
                "TalkPermitTone",
                321,
                2,
                ValueKind::strings(&["None", "Digital", "Analog", "Both"]),
            )
            .default_value("Digital"),
        )
        .field(FieldTypeDescriptor::new(
            "IntroScreen",
            323,
            1,
            ValueKind::strings(&["Character String", "Picture"]),
        ))
        .field(FieldTypeDescriptor::new("KeypadTones", 324, 1, ValueKind::OffOn))
        .field(flag("PasswordAndLock", 328))
        .field(FieldTypeDescriptor::new("RadioId", 384, 24, ValueKind::CallId))
        .field(text("RadioName", 512, 16))
        .field(
            FieldTypeDescriptor::new(
                "TxPreambleDuration",
                768,
                8,
                ValueKind::Span(SpanSpec::new(0, 144).scale(60)),
            )
            .default_value("600"),
        )
        .field(
            FieldTypeDescriptor::new("VoxSensitivity", 776, 8, ValueKind::Span(SpanSpec::new(1, 10)))
                .default_value("3"),
        )
        .field(FieldTypeDescriptor::new(
            "BacklightTime",
            784,
            8,
            ValueKind::indexed_strings(&[(0, "Always"), (1, "5"), (2, "10"), (3, "15")]),
        ))
        .field(
            FieldTypeDescriptor::new("PowerOnPassword", 800, 32, ValueKind::RadioPassword)
                .enabled_when("PasswordAndLock", &["On"]),
        )
        .field(FieldTypeDescriptor::new("PcProgramPassword", 832, 64, ValueKind::PcPassword))
        .field(FieldTypeDescriptor::new("CpsVersion", 896, 32, ValueKind::Hex))
        .field(FieldTypeDescriptor::new("LastProgrammed", 960, 56, ValueKind::Timestamp))
        .field(FieldTypeDescriptor::new(
            "SerialNumber",
            1024,
            32,
            ValueKind::Bcd { big_endian: false },
        ))
}

pub(super) fn text_messages() -> RecordTypeDescriptor {
    RecordTypeDescriptor::new("TextMessages", 0x2180, 288, 50)
        .name_prefix("Message")
        .field(text("Text", 0, 144))
}

pub(super) fn contacts(offset: usize, max: usize) -> RecordTypeDescriptor {
    RecordTypeDescriptor::new("Contacts", offset, 36, max)
        .tombstone(0, 3, 0xFF)
        .fill(0xFF)
        .named_by("Name")
        .name_prefix("Contact")
        .field(FieldTypeDescriptor::new("CallId", 0, 24, ValueKind::CallId))
        .field(flag("CallReceiveTone", 26))
        .field(
            FieldTypeDescriptor::new(
                "CallType",
                30,
                2,
                ValueKind::indexed_strings(&[(1, "Group"), (2, "Private"), (3, "All")]),
            )
            .default_value("Group"),
        )
        .field(text("Name", 32, 16))
}

pub(super) fn group_lists() -> RecordTypeDescriptor {
    RecordTypeDescriptor::new("GroupLists", 0xEC20, 96, 250)
        .tombstone(0, 2, 0)
        .named_by("Name")
        .name_prefix("GroupList")
        .field(text("Name", 0, 16))
        .field(
            FieldTypeDescriptor::new("ContactMember", 256, 16, ValueKind::members("Contacts"))
                .repeat(32),
        )
}

/// Zones hold 16 channel members in the record; the rest go to `extension`
pub(super) fn zones(members: FieldTypeDescriptor) -> RecordTypeDescriptor {
    RecordTypeDescriptor::new("Zones", 0x149E0, 64, 250)
        .tombstone(0, 2, 0)
        .named_by("Name")
        .name_prefix("Zone")
        .field(text("Name", 0, 16))
        .field(members)
}

pub(super) fn zone_members() -> FieldTypeDescriptor {
    FieldTypeDescriptor::new("ChannelMember", 256, 16, ValueKind::members("Channels")).repeat(16)
}

pub(super) fn scan_lists() -> RecordTypeDescriptor {
    let priority = |name: &str, bit_offset| {
        FieldTypeDescriptor::new(
            name,
            bit_offset,
            16,
            ValueKind::list_index("Channels", &[(0xFFFF, "None"), (0, "Selected")]),
        )
    };
    RecordTypeDescriptor::new("ScanLists", 0x18860, 104, 250)
        .tombstone(0, 2, 0)
        .named_by("Name")
        .name_prefix("ScanList")
        .field(text("Name", 0, 16))
        .field(priority("PriorityChannel1", 256))
        .field(priority("PriorityChannel2", 272))
        .field(FieldTypeDescriptor::new(
            "TxDesignatedChannel",
            288,
            16,
            ValueKind::list_index("Channels", &[(0, "Last Active Channel"), (0xFFFF, "Selected")]),
        ))
        .field(
            FieldTypeDescriptor::new(
                "SignalingHoldTime",
                312,
                8,
                ValueKind::Span(SpanSpec::new(2, 255).scale(25)),
            )
            .default_value("500"),
        )
        .field(
            FieldTypeDescriptor::new(
                "PrioritySampleTime",
                320,
                8,
                ValueKind::Span(SpanSpec::new(3, 31).scale(250)),
            )
            .default_value("2000"),
        )
        .field(
            FieldTypeDescriptor::new("ChannelMember", 336, 16, ValueKind::members("Channels"))
                .repeat(31),
        )
}

/// Channel records; `tx` is the transmit frequency field at bit 160
pub(super) fn channels(
    offset: usize,
    max: usize,
    bands: Vec<Band>,
    tx: FieldTypeDescriptor,
) -> RecordTypeDescriptor {
    let digital = |ft: FieldTypeDescriptor| ft.enabled_when("ChannelMode", &["Digital"]);
    let analog = |ft: FieldTypeDescriptor| ft.enabled_when("ChannelMode", &["Analog"]);

    RecordTypeDescriptor::new("Channels", offset, 64, max)
        .tombstone(16, 4, 0xFF)
        .fill(0xFF)
        .named_by("Name")
        .name_prefix("Channel")
        .field(flag("LoneWorker", 0))
        .field(
            FieldTypeDescriptor::new("Squelch", 2, 1, ValueKind::strings(&["Tight", "Normal"]))
                .default_value("Normal"),
        )
        .field(flag("Autoscan", 3))
        .field(
            FieldTypeDescriptor::new("Bandwidth", 4, 2, ValueKind::strings(&["12.5", "20", "25"]))
                .default_value("12.5"),
        )
        .field(
            FieldTypeDescriptor::new(
                "ChannelMode",
                6,
                2,
                ValueKind::indexed_strings(&[(1, "Analog"), (2, "Digital")]),
            )
            .default_value("Analog"),
        )
        .field(digital(
            FieldTypeDescriptor::new(
                "ColorCode",
                8,
                4,
                ValueKind::Span(SpanSpec::new(
                    *COLOR_CODES.start() as i64,
                    *COLOR_CODES.end() as i64,
                )),
            )
            .default_value("1"),
        ))
        .field(digital(
            FieldTypeDescriptor::new(
                "RepeaterSlot",
                12,
                2,
                ValueKind::indexed_strings(&[(1, "1"), (2, "2")]),
            )
            .default_value("1"),
        ))
        .field(flag("RxOnly", 14))
        .field(flag("AllowTalkaround", 16))
        .field(digital(FieldTypeDescriptor::new(
            "Privacy",
            18,
            2,
            ValueKind::strings(&["None", "Basic", "Enhanced"]),
        )))
        .field(
            FieldTypeDescriptor::new("PrivacyNumber", 20, 4, ValueKind::Span(SpanSpec::new(0, 15)))
                .disabled_when("Privacy", &["None"]),
        )
        .field(
            FieldTypeDescriptor::new("Power", 24, 1, ValueKind::strings(&["Low", "High"]))
                .default_value("High"),
        )
        .field(flag("Vox", 25))
        .field(digital(FieldTypeDescriptor::new(
            "ContactName",
            32,
            16,
            ValueKind::list_index("Contacts", &[(0, "None")]),
        )))
        .field(
            FieldTypeDescriptor::new(
                "Tot",
                48,
                8,
                ValueKind::Span(SpanSpec::new(0, 63).scale(15).min_string("Infinite")),
            )
            .default_value("60"),
        )
        .field(FieldTypeDescriptor::new(
            "TotRekeyDelay",
            56,
            8,
            ValueKind::Span(SpanSpec::new(0, 255)),
        ))
        .field(FieldTypeDescriptor::new(
            "ScanList",
            64,
            16,
            ValueKind::list_index("ScanLists", &[(0, "None")]),
        ))
        .field(digital(FieldTypeDescriptor::new(
            "GroupList",
            80,
            16,
            ValueKind::list_index("GroupLists", &[(0, "None")]),
        )))
        .field(FieldTypeDescriptor::new(
            "RxFrequency",
            128,
            32,
            ValueKind::Frequency { bands },
        ))
        .field(tx)
        .field(analog(FieldTypeDescriptor::new("CtcssDecode", 192, 16, ValueKind::CtcssDcs)))
        .field(analog(FieldTypeDescriptor::new("CtcssEncode", 208, 16, ValueKind::CtcssDcs)))
        .field(text("Name", 256, 16))
}

pub fn schema() -> ModelSchema {
    ModelSchema {
        vendor: "TYT".to_string(),
        model: MODEL.to_string(),
        description: "MD-380 UHF DMR handheld".to_string(),
        buffer_size: MEMSIZE,
        fill: 0xFF,
        device_range: Some((0x2000, MEMSIZE - 0x2000)),
        layouts: layouts(MEMSIZE),
        record_types: vec![
            general_settings(),
            text_messages(),
            contacts(0x5F80, 1000),
            group_lists(),
            zones(zone_members()),
            scan_lists(),
            channels(
                0x1EE00,
                1000,
                uhf(),
                FieldTypeDescriptor::new("TxFrequency", 160, 32, ValueKind::Frequency { bands: uhf() }),
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::assert_bit_isolation;

    #[test]
    fn test_schema_checks() {
        let schema = schema().link();
        schema.check().unwrap();
        assert_eq!(schema.layout_for_size(262_709).unwrap().kind, FileKind::Rdt);
        assert_eq!(schema.layout(FileKind::Bin).unwrap().file_size, MEMSIZE);

        let channels = schema.record_type("Channels").unwrap();
        assert_eq!(
            channels.field_type("ChannelMode").unwrap().enables,
            vec![
                "ColorCode".to_string(),
                "RepeaterSlot".to_string(),
                "Privacy".to_string(),
                "ContactName".to_string(),
                "GroupList".to_string(),
                "CtcssDecode".to_string(),
                "CtcssEncode".to_string(),
            ]
        );
        assert_eq!(channels.max_name_len(), 16);
        assert_eq!(schema.record_types[0].generated_name(0), "General Settings");
    }

    #[test]
    fn test_bit_isolation() {
        assert_bit_isolation(&schema().link());
    }
}
