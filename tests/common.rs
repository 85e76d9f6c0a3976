#![allow(dead_code)]

// filename according to https://doc.rust-lang.org/book/ch11-03-test-organization.html
use ap_param::{
    ConversionInfo, Float, Flags, GroupElement, GroupInfo, Info, Int8, Int16, Notify, ParamGroup,
    ParamType, ParamValue, Vector3, Vector3f, group_info, nested_group_info,
    setup_object_defaults, subgroup_info, subgroup_ptr, var_group, var_group_ptr, var_info,
};
use embedded_storage::{ReadStorage, Storage};

pub const EEPROM_SIZE: usize = 1024;
pub const HEADER_SIZE: usize = 4;
pub const SENTINEL: [u8; 4] = [0xFF, 0xFF, 0x3F, 0x00];

pub struct Eeprom {
    pub buf: Vec<u8>,
    pub fail_after_operation: usize,
    pub operations: Vec<Operation>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Operation {
    Read { offset: u32, len: usize },
    Write { offset: u32, len: usize },
}

impl Eeprom {
    /// A blank device reads as all ones.
    pub fn new(size: usize) -> Self {
        Self {
            buf: vec![0xFFu8; size],
            fail_after_operation: usize::MAX,
            operations: Vec::new(),
        }
    }

    pub fn new_with_fault(size: usize, fail_after_operation: usize) -> Self {
        Self {
            fail_after_operation,
            ..Self::new(size)
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn disable_faults(&mut self) {
        self.fail_after_operation = usize::MAX;
    }

    pub fn writes(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Write { .. }))
            .count()
    }

    pub fn clear_operations(&mut self) {
        self.operations.clear();
    }

    pub fn dump_operations(&self) {
        println!("Operations:");
        for op in &self.operations {
            println!("  {:?}", op);
        }
    }

    /// Writes a raw record at `offset` followed by the sentinel, bypassing the store.
    pub fn put_record(
        &mut self,
        offset: usize,
        key: u16,
        type_: ParamType,
        ge: u32,
        payload: &[u8],
    ) {
        let key = u32::from(key);
        let word = (key & 0xFF) | (type_ as u32) << 8 | ((key >> 8) & 1) << 13 | ge << 14;
        self.buf[offset..offset + 4].copy_from_slice(&word.to_le_bytes());
        self.buf[offset + 4..offset + 4 + payload.len()].copy_from_slice(payload);
        let end = offset + 4 + payload.len();
        self.buf[end..end + 4].copy_from_slice(&SENTINEL);
    }
}

#[derive(Debug)]
pub struct EepromError;

impl ReadStorage for Eeprom {
    type Error = EepromError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        println!(
            "    eeprom: read:  0x{offset:04X}[0x{:04X}] #{:>2}",
            bytes.len(),
            self.operations.len()
        );
        if self.operations.len() >= self.fail_after_operation {
            println!("    eeprom: FAULT");
            return Err(EepromError);
        }
        self.operations.push(Operation::Read {
            offset,
            len: bytes.len(),
        });

        let offset = offset as usize;
        assert!(offset + bytes.len() <= self.buf.len());
        bytes.copy_from_slice(&self.buf[offset..offset + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl Storage for Eeprom {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        println!(
            "    eeprom: write: 0x{offset:04X}[0x{:04X}] #{:>2}",
            bytes.len(),
            self.operations.len()
        );
        if self.operations.len() >= self.fail_after_operation {
            println!("    eeprom: FAULT");
            return Err(EepromError);
        }
        self.operations.push(Operation::Write {
            offset,
            len: bytes.len(),
        });

        let offset = offset as usize;
        assert!(offset + bytes.len() <= self.buf.len());
        self.buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

// lets the tests keep ownership of the device across several stores
impl ReadStorage for &mut Eeprom {
    type Error = EepromError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read(offset, bytes)
    }

    fn capacity(&self) -> usize {
        (**self).capacity()
    }
}

impl Storage for &mut Eeprom {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).write(offset, bytes)
    }
}

/// Records every notification.
#[derive(Default)]
pub struct Recorder {
    pub sent: Vec<(String, ParamType, ParamValue)>,
}

impl Notify for Recorder {
    fn notify(&mut self, name: &str, type_: ParamType, value: &ParamValue) {
        self.sent.push((name.to_string(), type_, *value));
    }
}

pub struct Notch {
    pub enable: Int8,
    pub freq: Float,
    pub bandwidth: Float,
}

impl ParamGroup for Notch {
    const VAR_INFO: &'static [GroupInfo] = &[
        group_info!("ENABLE", 1, Notch, enable: Int8, 0, Flags::ENABLE),
        group_info!("FREQ", 2, Notch, freq: Float, 80.0),
        group_info!("BW", 3, Notch, bandwidth: Float, 40.0),
    ];
}

impl Notch {
    pub fn new() -> Self {
        let mut notch = Notch {
            enable: Int8::default(),
            freq: Float::default(),
            bandwidth: Float::default(),
        };
        setup_object_defaults(&mut notch, Self::VAR_INFO);
        notch
    }
}

pub struct Ins {
    pub gyro_offs: Vector3,
    pub accel_offs: Vector3,
    pub gyro_filter: Int8,
    pub notch: Option<Box<Notch>>,
}

impl ParamGroup for Ins {
    const VAR_INFO: &'static [GroupInfo] = &[
        group_info!("GYROFFS", 1, Ins, gyro_offs: Vector3, 0),
        group_info!("ACCOFFS", 2, Ins, accel_offs: Vector3, 0),
        group_info!("GYRO_FILTER", 3, Ins, gyro_filter: Int8, 20),
        subgroup_ptr!("HNTC", 4, Ins, notch: Notch),
    ];
}

pub struct Battery {
    pub volt_max: Float,
    pub volt_min: Float,
}

impl ParamGroup for Battery {
    const VAR_INFO: &'static [GroupInfo] = &[
        group_info!("VOLT_MAX", 1, Battery, volt_max: Float, 0),
        group_info!("VOLT_MIN", 2, Battery, volt_min: Float, 0),
    ];
}

pub struct Motors {
    pub enable: Int8,
    pub pwm_min: Int16,
    pub spin_max: Float,
    pub battery: Battery,
}

impl ParamGroup for Motors {
    const VAR_INFO: &'static [GroupInfo] = &[
        group_info!("ENABLE", 1, Motors, enable: Int8, 1, Flags::ENABLE),
        group_info!("PWM_MIN", 2, Motors, pwm_min: Int16, 1000),
        group_info!("SPIN_MAX", 3, Motors, spin_max: Float, 0.95),
        subgroup_info!("BAT", 4, Motors, battery: Battery),
    ];
}

pub struct AhrsBackend {
    pub gps_gain: Float,
}

impl ParamGroup for AhrsBackend {
    const VAR_INFO: &'static [GroupInfo] =
        &[group_info!("GPS_GAIN", 1, AhrsBackend, gps_gain: Float, 1.0)];
}

pub struct Ahrs {
    pub backend: AhrsBackend,
    pub orientation: Int8,
}

impl ParamGroup for Ahrs {
    const VAR_INFO: &'static [GroupInfo] = &[
        nested_group_info!(1, Ahrs, backend: AhrsBackend),
        group_info!("ORIENT", 2, Ahrs, orientation: Int8, 0),
    ];
}

pub struct Avoid {
    pub type_: Int8,
    pub margin: Float,
}

impl ParamGroup for Avoid {
    const VAR_INFO: &'static [GroupInfo] = &[
        group_info!("TYPE", 1, Avoid, type_: Int8, 1),
        group_info!("MARGIN_MAX", 2, Avoid, margin: Float, 2.0),
    ];
}

impl Avoid {
    pub fn new() -> Self {
        let mut avoid = Avoid {
            type_: Int8::default(),
            margin: Float::default(),
        };
        setup_object_defaults(&mut avoid, Self::VAR_INFO);
        avoid
    }
}

pub struct Vehicle {
    pub format_version: Int16,
    pub sysid: Int16,
    pub ins: Ins,
    pub motors: Motors,
    pub ahrs: Ahrs,
    pub avoid: Option<Box<Avoid>>,
}

pub static VAR_INFO: &[Info] = &[
    var_info!("FORMAT_VERSION", 0, Vehicle, format_version: Int16, 12),
    var_info!("SYSID_THISMAV", 1, Vehicle, sysid: Int16, 1),
    var_group!("INS", 2, Vehicle, ins: Ins),
    var_group!("MOT", 5, Vehicle, motors: Motors),
    var_group!("AHRS", 7, Vehicle, ahrs: Ahrs),
    var_group_ptr!("OA", 9, Vehicle, avoid: Avoid),
];

impl Vehicle {
    /// A vehicle with every parameter at its compiled-in default.
    pub fn new() -> Self {
        Vehicle {
            format_version: Int16::new(12),
            sysid: Int16::new(1),
            ins: Ins {
                gyro_offs: Vector3::new(Vector3f::splat(0.0)),
                accel_offs: Vector3::new(Vector3f::splat(0.0)),
                gyro_filter: Int8::new(20),
                notch: None,
            },
            motors: Motors {
                enable: Int8::new(1),
                pwm_min: Int16::new(1000),
                spin_max: Float::new(0.95),
                battery: Battery {
                    volt_max: Float::new(0.0),
                    volt_min: Float::new(0.0),
                },
            },
            ahrs: Ahrs {
                backend: AhrsBackend {
                    gps_gain: Float::new(1.0),
                },
                orientation: Int8::new(0),
            },
            avoid: None,
        }
    }
}

/// Every position visited by `next()` while the pointers are empty and the motors are enabled.
pub const ALL_POSITIONS: usize = 23;
/// Every position visited by `next_scalar()` in the same state.
pub const ALL_SCALARS: usize = 16;

/// Parameters that used to live under keys 20 and 21.
pub static CONVERSION_TABLE: &[ConversionInfo] = &[
    ConversionInfo {
        old_key: 20,
        old_group_element: GroupElement::ROOT,
        type_: ParamType::Float,
        new_name: "MOT_SPIN_MAX",
    },
    ConversionInfo {
        old_key: 21,
        old_group_element: GroupElement::from_digits(&[3]),
        type_: ParamType::Int8,
        new_name: "AHRS_GPS_GAIN",
    },
];

pub fn store(eeprom: &mut Eeprom) -> ap_param::ParamStore<&mut Eeprom> {
    ap_param::ParamStore::new(VAR_INFO, 0, eeprom.len(), eeprom).unwrap()
}
