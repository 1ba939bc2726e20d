// Codeplug scenarios over the built-in models

use super::*;
use crate::core::{Change, ChangeKind, Record, SourcePosition, WarningKind};
use crate::drivers::mock::MockDevice;
use crate::drivers::{DeviceError, ProgressCallback};
use crate::schema::{FieldTypeDescriptor, FileKind, ModelSchema, RecordTypeDescriptor, ValueKind};
use crate::value::{ListRef, Value};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn codeplug(model: &str) -> Codeplug {
    Codeplug::new_model(model, CodeplugConfig::default()).unwrap()
}

/// Append a channel and name it; returns its index
fn add_channel(cp: &mut Codeplug, name: &str) -> usize {
    let index = cp.records("Channels").unwrap().len();
    let record = cp.new_record("Channels").unwrap();
    cp.insert_record("Channels", index, record).unwrap();
    cp.set_field("Channels", index, "Name", 0, name).unwrap();
    index
}

fn add_zone(cp: &mut Codeplug, name: &str, members: &[&str]) -> usize {
    let index = cp.records("Zones").unwrap().len();
    let record = cp.new_record("Zones").unwrap();
    cp.insert_record("Zones", index, record).unwrap();
    cp.set_field("Zones", index, "Name", 0, name).unwrap();
    for (i, member) in members.iter().enumerate() {
        cp.insert_field("Zones", index, "ChannelMember", i, member).unwrap();
    }
    index
}

fn field_index(cp: &Codeplug, record_type: &str, field_type: &str) -> usize {
    cp.schema()
        .record_type(record_type)
        .and_then(|rt| rt.field_index(field_type))
        .unwrap()
}

fn channel_slot(cp: &Codeplug, slot: usize) -> usize {
    cp.schema().record_type("Channels").unwrap().slot_offset(slot)
}

#[test]
fn test_new_channel_survives_store_and_load() -> Result<()> {
    let mut cp = codeplug("UV380");
    let index = add_channel(&mut cp, "Channel");
    cp.set_field("Channels", index, "RxFrequency", 0, "145.50000")?;
    cp.set_field("Channels", index, "Name", 0, "Repeater1")?;

    cp.store()?;
    cp.load()?;

    let rx = field_index(&cp, "Channels", "RxFrequency");
    let channel = cp.record("Channels", 0)?;
    assert_eq!(channel.value(rx), Some(&Value::Frequency(14_550_000)));
    assert_eq!(cp.record_name("Channels", 0)?, "Repeater1");
    assert_eq!(cp.field_display("Channels", 0, "RxFrequency", 0)?, "145.50000");
    assert!(cp.valid().for_field("Channels", "RxFrequency").is_empty());
    Ok(())
}

#[test]
fn test_zone_deferred_until_channel_exists() -> Result<()> {
    let mut cp = codeplug("MD380");

    let mut zone = cp.new_record("Zones")?;
    let member = cp.new_field_with_value(
        "Zones",
        &zone,
        "ChannelMember",
        0,
        "Repeater1",
        Some(SourcePosition::new(3, 7).in_source("zones.txt")),
    )?;
    assert!(member.is_deferred());
    cp.place_field("Zones", &mut zone, member)?;
    cp.insert_record("Zones", 0, zone)?;

    let warnings = cp.valid();
    let pending = warnings.for_field("Zones", "ChannelMember");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].kind, WarningKind::Unresolved);
    assert!(pending[0].to_string().starts_with("zones.txt:3:7: Zones[1]"));

    let mut channel = cp.new_record("Channels")?;
    let name = cp.new_field_with_value("Channels", &channel, "Name", 0, "Repeater1", None)?;
    cp.place_field("Channels", &mut channel, name)?;
    cp.insert_record("Channels", 0, channel)?;

    let report = cp.resolve_deferred_fields();
    assert_eq!(report.passes, 1);
    assert_eq!(report.resolved, 1);
    assert!(report.warnings.is_empty());
    assert!(cp.valid().for_field("Zones", "ChannelMember").is_empty());
    assert_eq!(cp.field_display("Zones", 0, "ChannelMember", 0)?, "Repeater1");
    Ok(())
}

#[test]
fn test_loaded_zone_members_resolve_after_channels() -> Result<()> {
    let mut cp = codeplug("UV380");
    for name in ["A", "B", "C"] {
        add_channel(&mut cp, name);
    }
    let members: Vec<String> = (0..20).map(|i| ["A", "B", "C"][i % 3].to_string()).collect();
    let members: Vec<&str> = members.iter().map(String::as_str).collect();
    add_zone(&mut cp, "Everything", &members);

    cp.store()?;
    let warnings = cp.load()?;
    assert!(warnings.for_field("Zones", "ChannelMember").is_empty());

    let zone = cp.record("Zones", 0)?;
    let fi = field_index(&cp, "Zones", "ChannelMember");
    assert_eq!(zone.fields[fi].len(), 20);
    assert_eq!(cp.field_display("Zones", 0, "ChannelMember", 17)?, "C");
    assert_eq!(cp.field_display("Zones", 0, "ChannelMember", 18)?, "A");
    Ok(())
}

#[test]
fn test_removed_record_is_tombstoned() -> Result<()> {
    let mut cp = codeplug("MD380");
    for name in ["One", "Two", "Three"] {
        add_channel(&mut cp, name);
    }
    cp.remove_records("Channels", &[1])?;
    cp.store()?;

    let tombstone = channel_slot(&cp, 2) + 16;
    assert_eq!(cp.buffer().get(tombstone, 4)?, &[0xFF; 4]);
    assert_ne!(cp.buffer().get(channel_slot(&cp, 1) + 16, 4)?, &[0xFF; 4]);

    let before: Vec<Record> = cp.records("Channels")?.to_vec();
    cp.load()?;
    let rt = cp.schema().record_type("Channels").unwrap().clone();
    assert_eq!(
        cp.records("Channels")?.iter().map(|r| r.name(&rt)).collect::<Vec<_>>(),
        vec!["One", "Three"]
    );
    for (loaded, stored) in cp.records("Channels")?.iter().zip(&before) {
        assert_eq!(loaded.fields, stored.fields);
    }
    Ok(())
}

#[test]
fn test_store_load_is_idempotent() -> Result<()> {
    let mut cp = codeplug("UV380");
    add_channel(&mut cp, "Simplex");
    add_channel(&mut cp, "Repeater1");
    add_zone(&mut cp, "Local", &["Repeater1", "Simplex"]);

    let first = cp.hash()?;
    cp.load()?;
    assert_eq!(cp.hash()?, first);
    Ok(())
}

#[test]
fn test_channel_mode_gates_digital_fields() -> Result<()> {
    let mut cp = codeplug("MD380");
    let index = add_channel(&mut cp, "Talkgroup");
    let digital = ["ColorCode", "RepeaterSlot", "Privacy", "ContactName", "GroupList"];

    for field in digital {
        assert!(!cp.field_is_enabled("Channels", index, field)?, "{}", field);
    }
    assert!(cp.field_is_enabled("Channels", index, "CtcssDecode")?);

    cp.set_field("Channels", index, "ChannelMode", 0, "Digital")?;
    for field in digital {
        assert!(cp.field_is_enabled("Channels", index, field)?, "{}", field);
    }
    assert!(!cp.field_is_enabled("Channels", index, "CtcssDecode")?);
    assert!(!cp.field_is_enabled("Channels", index, "PrivacyNumber")?);

    cp.set_field("Channels", index, "Privacy", 0, "Basic")?;
    assert!(cp.field_is_enabled("Channels", index, "PrivacyNumber")?);

    cp.set_field("Channels", index, "ChannelMode", 0, "Analog")?;
    assert!(!cp.field_is_enabled("Channels", index, "Privacy")?);
    assert!(!cp.field_is_enabled("Channels", index, "PrivacyNumber")?);
    Ok(())
}

#[test]
fn test_disabled_invalid_field_is_not_reported() -> Result<()> {
    let mut cp = codeplug("MD380");
    add_channel(&mut cp, "Analog1");
    cp.store()?;

    // ContactName points at an empty contact slot
    let contact = channel_slot(&cp, 0) + 4;
    cp.buffer.set_bytes(contact, &[7, 0])?;
    cp.load()?;

    let fi = field_index(&cp, "Channels", "ContactName");
    assert!(cp.record("Channels", 0)?.fields[fi][0].is_invalid());
    assert!(cp.valid().for_field("Channels", "ContactName").is_empty());

    cp.set_field("Channels", 0, "ChannelMode", 0, "Digital")?;
    assert_eq!(cp.valid().for_field("Channels", "ContactName").len(), 1);

    // The unreadable code is written back untouched
    cp.store()?;
    assert_eq!(cp.buffer().get(contact, 2)?, &[7, 0]);
    Ok(())
}

#[test]
fn test_names_are_made_unique() -> Result<()> {
    let mut cp = codeplug("MD380");
    add_channel(&mut cp, "Repeater1");
    add_channel(&mut cp, "Repeater1");
    assert_eq!(cp.record_name("Channels", 1)?, "Repeater2");

    // Renaming a record to its own name keeps it
    cp.set_field("Channels", 0, "Name", 0, "Repeater1")?;
    assert_eq!(cp.record_name("Channels", 0)?, "Repeater1");

    let record = cp.new_record("Channels")?;
    assert_eq!(record.name(cp.schema().record_type("Channels").unwrap()), "Channel3");

    add_channel(&mut cp, "LongRepeaterName");
    add_channel(&mut cp, "LongRepeaterName");
    assert_eq!(cp.record_name("Channels", 3)?, "LongRepeaterNam1");

    assert!(matches!(
        cp.set_field("Channels", 0, "Name", 0, ""),
        Err(CodeplugError::Value { .. })
    ));
    Ok(())
}

#[test]
fn test_indices_stay_contiguous() -> Result<()> {
    let mut cp = codeplug("MD380");
    for name in ["A", "B", "C", "D"] {
        add_channel(&mut cp, name);
    }
    cp.move_record("Channels", 3, 0)?;
    cp.remove_records("Channels", &[2, 0])?;

    let rt = cp.schema().record_type("Channels").unwrap().clone();
    let channels = cp.records("Channels")?;
    assert_eq!(channels.iter().map(|r| r.name(&rt)).collect::<Vec<_>>(), vec!["A", "C"]);
    assert_eq!(channels.iter().map(|r| r.index).collect::<Vec<_>>(), vec![0, 1]);

    add_zone(&mut cp, "Z", &["A", "C", "A"]);
    cp.move_field("Zones", 0, "ChannelMember", 2, 0)?;
    cp.remove_field("Zones", 0, "ChannelMember", 1)?;
    let fi = field_index(&cp, "Zones", "ChannelMember");
    let members = &cp.record("Zones", 0)?.fields[fi];
    assert_eq!(members.iter().map(|f| f.index).collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(cp.field_display("Zones", 0, "ChannelMember", 1)?, "C");
    Ok(())
}

#[test]
fn test_rename_and_remove_maintain_references() -> Result<()> {
    let mut cp = codeplug("MD380");
    add_channel(&mut cp, "Repeater1");
    add_channel(&mut cp, "Simplex");
    add_zone(&mut cp, "Local", &["Repeater1", "Simplex", "Repeater1"]);

    let scan = cp.new_record("ScanLists")?;
    cp.insert_record("ScanLists", 0, scan)?;
    cp.set_field("ScanLists", 0, "PriorityChannel1", 0, "Repeater1")?;

    cp.set_field("Channels", 0, "Name", 0, "Hilltop")?;
    assert_eq!(cp.field_display("Zones", 0, "ChannelMember", 2)?, "Hilltop");
    assert_eq!(cp.field_display("ScanLists", 0, "PriorityChannel1", 0)?, "Hilltop");
    let batch = cp.history().last().unwrap();
    assert_eq!(batch.kind, ChangeKind::RecordsFieldChange);
    assert_eq!(batch.fields.len(), 3);
    assert_eq!(batch.records.len(), 2);
    assert!(batch.previous.iter().all(|p| p == "Repeater1"));

    cp.remove_records("Channels", &[0])?;
    let fi = field_index(&cp, "Zones", "ChannelMember");
    assert_eq!(cp.record("Zones", 0)?.fields[fi].len(), 1);
    assert_eq!(cp.field_display("Zones", 0, "ChannelMember", 0)?, "Simplex");
    assert_eq!(cp.field_display("ScanLists", 0, "PriorityChannel1", 0)?, "None");
    assert!(cp.valid().is_empty());
    Ok(())
}

#[test]
fn test_set_field_rejects_bad_input() -> Result<()> {
    let mut cp = codeplug("MD380");
    add_channel(&mut cp, "Simplex");
    let before = cp.history().len();

    // MD380 is UHF only
    assert!(cp.set_field("Channels", 0, "RxFrequency", 0, "145.50000").is_err());
    assert!(cp.set_field("Channels", 0, "ColorCode", 0, "lots").is_err());
    assert!(cp.set_field("Channels", 0, "ContactName", 0, "Nobody").is_err());
    assert!(matches!(
        cp.set_field("Channels", 0, "Squelch", 0, "Loose"),
        Err(CodeplugError::Value { .. })
    ));
    assert_eq!(cp.history().len(), before);
    assert_eq!(cp.field_display("Channels", 0, "RxFrequency", 0)?, "400.00000");
    Ok(())
}

#[test]
fn test_capacity_errors_emit_nothing() -> Result<()> {
    let mut cp = codeplug("MD380");
    for i in 0..16 {
        add_channel(&mut cp, &format!("Ch{}", i));
    }
    let names: Vec<String> = (0..16).map(|i| format!("Ch{}", i)).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    add_zone(&mut cp, "Full", &names);
    let before = cp.history().len();

    assert!(matches!(
        cp.insert_field("Zones", 0, "ChannelMember", 16, "Ch0"),
        Err(CodeplugError::FieldCapacity { max: 16, .. })
    ));
    let settings = cp.new_record("GeneralSettings")?;
    assert!(matches!(
        cp.insert_record("GeneralSettings", 0, settings),
        Err(CodeplugError::FixedRecordCount(_))
    ));
    assert!(matches!(
        cp.insert_field("Channels", 0, "Name", 0, "X"),
        Err(CodeplugError::NotRepeatable { .. })
    ));
    assert!(matches!(
        cp.remove_records("Channels", &[99]),
        Err(CodeplugError::IndexOutOfRange { .. })
    ));
    assert_eq!(cp.history().len(), before);
    Ok(())
}

#[test]
fn test_record_capacity() -> Result<()> {
    let mut cp = codeplug("MD380");
    for _ in 0..250 {
        let index = cp.records("Zones")?.len();
        let zone = cp.new_record("Zones")?;
        cp.insert_record("Zones", index, zone)?;
    }
    assert_eq!(cp.record_name("Zones", 249)?, "Zone250");
    let zone = cp.new_record("Zones")?;
    assert!(matches!(
        cp.insert_record("Zones", 0, zone),
        Err(CodeplugError::Capacity { max: 250, .. })
    ));
    Ok(())
}

#[test]
fn test_changes_reach_subscriber() -> Result<()> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut cp = codeplug("MD380");
    cp.subscribe(Box::new(move |c: &Change| sink.lock().unwrap().push(c.kind)));

    add_channel(&mut cp, "A");
    add_channel(&mut cp, "B");
    cp.move_record("Channels", 1, 0)?;
    add_zone(&mut cp, "Z", &["A"]);
    cp.remove_field("Zones", 0, "ChannelMember", 0)?;
    cp.remove_records("Channels", &[0])?;

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ChangeKind::InsertRecords,
            ChangeKind::FieldChange,
            ChangeKind::InsertRecords,
            ChangeKind::FieldChange,
            ChangeKind::MoveRecords,
            ChangeKind::InsertRecords,
            ChangeKind::FieldChange,
            ChangeKind::InsertFields,
            ChangeKind::RemoveFields,
            ChangeKind::RemoveRecords,
        ]
    );

    let rename = &cp.history()[1];
    assert_eq!(rename.previous, vec!["Channel1".to_string()]);
    assert_eq!(rename.fields[0].value, "A");
    assert!(cp.is_dirty());

    cp.unsubscribe();
    cp.revert()?;
    assert!(cp.history().is_empty());
    assert!(cp.records("Channels")?.is_empty());
    assert_eq!(seen.lock().unwrap().len(), 10);
    Ok(())
}

#[test]
fn test_revert_discards_unstored_edits() -> Result<()> {
    let mut cp = codeplug("MD380");
    let blank = cp.buffer().clone();
    add_channel(&mut cp, "Scratch");
    assert!(cp.changed()?);
    cp.hash()?;
    assert_eq!(cp.buffer(), &blank);

    cp.revert()?;
    assert!(cp.records("Channels")?.is_empty());
    assert!(!cp.changed()?);

    // A stored edit is what revert goes back to
    add_channel(&mut cp, "Kept");
    cp.store()?;
    cp.revert()?;
    assert_eq!(cp.record_name("Channels", 0)?, "Kept");
    Ok(())
}

#[test]
fn test_record_named_by_reference() -> Result<()> {
    let schema = ModelSchema {
        vendor: "Test".to_string(),
        model: "Links".to_string(),
        description: String::new(),
        buffer_size: 1024,
        fill: 0xFF,
        device_range: None,
        layouts: vec![],
        record_types: vec![
            RecordTypeDescriptor::new("Channels", 0, 20, 8)
                .named_by("Name")
                .tombstone(16, 4, 0xFF)
                .field(FieldTypeDescriptor::new("Name", 0, 128, ValueKind::Text)),
            RecordTypeDescriptor::new("Links", 512, 2, 2)
                .named_by("Peer")
                .field(FieldTypeDescriptor::new(
                    "Peer",
                    0,
                    16,
                    ValueKind::list_index("Channels", &[(0, "None")]),
                )),
        ],
    }
    .link();
    schema.check()?;
    let mut cp = Codeplug::new(Arc::new(schema), CodeplugConfig::default())?;
    add_channel(&mut cp, "Cha2");

    let fresh = cp.new_record("Links")?;
    assert_eq!(fresh.value(0), Some(&Value::ListRef(ListRef::Reserved(0))));

    cp.set_field("Links", 0, "Peer", 0, "Cha2")?;
    assert_eq!(cp.record_name("Links", 0)?, "Cha2");
    cp.set_field("Links", 1, "Peer", 0, "Cha2")?;
    assert_eq!(cp.record_name("Links", 1)?, "Cha2");
    assert!(cp.valid().is_empty());
    Ok(())
}

#[test]
fn test_save_and_open() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("radio.rdt");
    let mut cp = codeplug("MD380");
    add_channel(&mut cp, "Repeater1");
    cp.save_as(&path, FileKind::Rdt)?;
    assert!(!cp.changed()?);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 262_709);

    let (mut opened, warnings) = Codeplug::open(&path, CodeplugConfig::default())?;
    assert!(warnings.is_empty(), "{}", warnings);
    assert_eq!(opened.schema().model, "MD380");
    assert_eq!(opened.layout().map(|l| l.kind), Some(FileKind::Rdt));
    assert_eq!(opened.record_name("Channels", 0)?, "Repeater1");
    assert!(!opened.changed()?);

    opened.set_field("Channels", 0, "Power", 0, "Low")?;
    assert!(opened.changed()?);
    opened.set_field("Channels", 0, "Power", 0, "High")?;
    assert!(!opened.changed()?);

    let bin = dir.path().join("radio.bin");
    opened.save_as(&bin, FileKind::Bin)?;
    assert_eq!(std::fs::metadata(&bin).unwrap().len(), 0x40000);
    assert_eq!(opened.path(), Some(bin.as_path()));
    Ok(())
}

#[test]
fn test_rdt_envelope_is_kept() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vendor.rdt");
    let blank = codeplug("MD380");
    let mut data = vec![0xAB; 549];
    data.extend_from_slice(blank.buffer().as_bytes());
    data.extend_from_slice(&[0xCD; 16]);
    std::fs::write(&path, &data).unwrap();

    let (mut cp, _) = Codeplug::open(&path, CodeplugConfig::default())?;
    add_channel(&mut cp, "Simplex");
    cp.save()?;

    let saved = std::fs::read(&path).unwrap();
    assert_eq!(saved.len(), data.len());
    assert_eq!(&saved[..549], &data[..549]);
    assert_eq!(&saved[saved.len() - 16..], &[0xCD; 16]);
    Ok(())
}

#[test]
fn test_unknown_file_size() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.bin");
    std::fs::write(&path, [0u8; 100]).unwrap();
    assert!(matches!(
        Codeplug::open(&path, CodeplugConfig::default()),
        Err(CodeplugError::UnknownFileSize(100))
    ));
}

#[test]
fn test_save_blocked_by_warnings() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blocked.bin");
    let config = CodeplugConfig::new().with_block_save_on_warnings(true);
    let mut cp = Codeplug::new_model("MD380", config)?;
    add_channel(&mut cp, "Digital1");
    cp.set_field("Channels", 0, "ChannelMode", 0, "Digital")?;
    cp.store()?;
    let contact = channel_slot(&cp, 0) + 4;
    cp.buffer.set_bytes(contact, &[9, 0])?;
    cp.load()?;

    assert!(matches!(cp.save_as(&path, FileKind::Bin), Err(CodeplugError::Invalid(_))));
    assert!(!path.exists());
    Ok(())
}

#[test]
fn test_device_round_trip() -> Result<()> {
    let mut cp = codeplug("MD380");
    add_channel(&mut cp, "Repeater1");
    let (start, len) = cp.schema().device_range.unwrap();

    let progress_seen = Arc::new(Mutex::new(0usize));
    let counter = progress_seen.clone();
    let progress: ProgressCallback = Box::new(move |_: usize, _: usize, _: &str| *counter.lock().unwrap() += 1);

    let mut device = MockDevice::new(vec![0xFF; len]);
    cp.write_to_device(&mut device, Some(&progress))?;
    cp.store()?;
    assert_eq!(device.flash(), cp.buffer().get(start, len)?.to_vec());
    assert!(*progress_seen.lock().unwrap() > 0);

    let mut fresh = codeplug("MD380");
    fresh.read_from_device(&mut device, None)?;
    assert_eq!(fresh.record_name("Channels", 0)?, "Repeater1");

    let mut offline = MockDevice::new(Vec::new()).disconnected();
    assert!(matches!(
        fresh.read_from_device(&mut offline, None),
        Err(CodeplugError::Device(DeviceError::NotConnected))
    ));
    Ok(())
}
