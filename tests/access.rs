mod common;

mod get {
    use crate::common;
    use crate::common::{EEPROM_SIZE, Eeprom, Vehicle};
    use ap_param::{Error, ParamType, Vector3f};
    use pretty_assertions::assert_eq;

    #[test]
    fn typed_values() {
        let mut eeprom = Eeprom::new(EEPROM_SIZE);
        let mut vehicle = Vehicle::new();
        vehicle.ins.gyro_offs.set(Vector3f::new(0.5, -0.25, 2.0));
        let store = common::store(&mut eeprom);

        assert_eq!(store.get::<i16>(&vehicle, "MOT_PWM_MIN"), Ok(1000));
        assert_eq!(store.get::<i8>(&vehicle, "INS_GYRO_FILTER"), Ok(20));
        assert_eq!(store.get::<f32>(&vehicle, "MOT_SPIN_MAX"), Ok(0.95));
        assert_eq!(
            store.get::<Vector3f>(&vehicle, "INS_GYROFFS"),
            Ok(Vector3f::new(0.5, -0.25, 2.0))
        );
    }

    #[test]
    fn float_reads_any_scalar() {
        let mut eeprom = Eeprom::new(EEPROM_SIZE);
        let mut vehicle = Vehicle::new();
        vehicle.ins.gyro_offs.set(Vector3f::new(0.5, -0.25, 2.0));
        let store = common::store(&mut eeprom);

        assert_eq!(store.get::<f32>(&vehicle, "MOT_PWM_MIN"), Ok(1000.0));
        assert_eq!(store.get::<f32>(&vehicle, "INS_GYROFFS_Y"), Ok(-0.25));
        assert_eq!(
            store.get::<f32>(&vehicle, "INS_GYROFFS"),
            Err(Error::TypeMismatch(ParamType::Vector3f))
        );
    }

    #[test]
    fn wrong_type() {
        let mut eeprom = Eeprom::new(EEPROM_SIZE);
        let vehicle = Vehicle::new();
        let store = common::store(&mut eeprom);

        assert_eq!(
            store.get::<i8>(&vehicle, "MOT_PWM_MIN"),
            Err(Error::TypeMismatch(ParamType::Int16))
        );
        assert_eq!(
            store.get::<i32>(&vehicle, "MOT_SPIN_MAX"),
            Err(Error::TypeMismatch(ParamType::Float))
        );
        assert_eq!(
            store.get::<f32>(&vehicle, "MOT_BAT"),
            Err(Error::TypeMismatch(ParamType::Group))
        );
    }

    #[test]
    fn unknown_names() {
        let mut eeprom = Eeprom::new(EEPROM_SIZE);
        let vehicle = Vehicle::new();
        let store = common::store(&mut eeprom);

        assert_eq!(store.get::<i16>(&vehicle, "MOT_PWM_MAX"), Err(Error::NotFound));
        // behind an empty pointer
        assert_eq!(store.get::<i8>(&vehicle, "OA_TYPE"), Err(Error::NotFound));
    }

    #[test]
    fn hidden_values_are_readable() {
        let mut eeprom = Eeprom::new(EEPROM_SIZE);
        let mut vehicle = Vehicle::new();
        let store = common::store(&mut eeprom);

        vehicle.motors.enable.set(0);
        assert_eq!(store.find(&vehicle, "MOT_PWM_MIN"), None);
        assert_eq!(store.get::<i16>(&vehicle, "MOT_PWM_MIN"), Ok(1000));
        assert_eq!(store.get::<f32>(&vehicle, "MOT_BAT_VOLT_MAX"), Ok(0.0));
    }

    #[test]
    fn value_of_token() {
        let mut eeprom = Eeprom::new(EEPROM_SIZE);
        let vehicle = Vehicle::new();
        let store = common::store(&mut eeprom);

        let (token, _) = store.find(&vehicle, "INS").unwrap();
        assert_eq!(
            store.value(&vehicle, token),
            Err(Error::TypeMismatch(ParamType::Group))
        );
        let (token, _) = store.find(&vehicle, "AHRS_ORIENT").unwrap();
        assert_eq!(store.value(&vehicle, token), Ok(ap_param::ParamValue::Int8(0)));
    }
}

mod set {
    use crate::common;
    use crate::common::{EEPROM_SIZE, Eeprom, Vehicle};
    use ap_param::{Error, ParamType, Vector3f};
    use pretty_assertions::assert_eq;

    #[test]
    fn typed_values() {
        let mut eeprom = Eeprom::new(EEPROM_SIZE);
        let mut vehicle = Vehicle::new();
        let mut store = common::store(&mut eeprom);

        store.set(&mut vehicle, "MOT_PWM_MIN", 1200i16).unwrap();
        store.set(&mut vehicle, "AHRS_ORIENT", -4i8).unwrap();
        store
            .set(&mut vehicle, "INS_ACCOFFS", Vector3f::new(1.0, 2.0, 3.0))
            .unwrap();

        assert_eq!(*vehicle.motors.pwm_min, 1200);
        assert_eq!(*vehicle.ahrs.orientation, -4);
        assert_eq!(vehicle.ins.accel_offs.get(), Vector3f::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn wrong_type() {
        let mut eeprom = Eeprom::new(EEPROM_SIZE);
        let mut vehicle = Vehicle::new();
        let mut store = common::store(&mut eeprom);

        assert_eq!(
            store.set(&mut vehicle, "MOT_PWM_MIN", 5i8),
            Err(Error::TypeMismatch(ParamType::Int16))
        );
        assert_eq!(
            store.set(&mut vehicle, "INS_ACCOFFS", 0.3f32),
            Err(Error::TypeMismatch(ParamType::Vector3f))
        );
        assert_eq!(
            store.set(&mut vehicle, "INS_ACCOFFS_X", Vector3f::splat(1.0)),
            Err(Error::TypeMismatch(ParamType::Float))
        );
        assert_eq!(store.set(&mut vehicle, "MOT_PWM_MAX", 1i16), Err(Error::NotFound));
        assert_eq!(*vehicle.motors.pwm_min, 1000);
    }

    #[test]
    fn float_is_converted() {
        let mut eeprom = Eeprom::new(EEPROM_SIZE);
        let mut vehicle = Vehicle::new();
        let mut store = common::store(&mut eeprom);

        store.set(&mut vehicle, "MOT_PWM_MIN", 1099.999f32).unwrap();
        assert_eq!(*vehicle.motors.pwm_min, 1100);
        store.set(&mut vehicle, "AHRS_ORIENT", -2.999f32).unwrap();
        assert_eq!(*vehicle.ahrs.orientation, -3);

        // out of range for an i8, ignored
        store.set(&mut vehicle, "MOT_ENABLE", 300.0f32).unwrap();
        assert_eq!(*vehicle.motors.enable, 1);

        store.set(&mut vehicle, "INS_ACCOFFS_Z", 0.3f32).unwrap();
        assert_eq!(vehicle.ins.accel_offs.get(), Vector3f::new(0.0, 0.0, 0.3));
    }

    #[test]
    fn hidden_values_can_be_set() {
        let mut eeprom = Eeprom::new(EEPROM_SIZE);
        let mut vehicle = Vehicle::new();
        vehicle.motors.enable.set(0);
        {
            let mut store = common::store(&mut eeprom);
            store.set(&mut vehicle, "MOT_SPIN_MAX", 0.9f32).unwrap();
            store.set_and_save(&mut vehicle, "MOT_PWM_MIN", 1250i16).unwrap();
        }
        assert_eq!(*vehicle.motors.spin_max, 0.9);

        let mut restored = Vehicle::new();
        let mut store = common::store(&mut eeprom);
        let _ = store.load_all(&mut restored);
        assert_eq!(*restored.motors.pwm_min, 1250);
    }

    #[test]
    fn set_and_save_by_name() {
        let mut eeprom = Eeprom::new(EEPROM_SIZE);
        {
            let mut vehicle = Vehicle::new();
            let mut store = common::store(&mut eeprom);
            store
                .set_and_save(&mut vehicle, "INS_GYROFFS", Vector3f::new(0.1, 0.2, 0.3))
                .unwrap();
            // equal to the default but still stored
            store.set_and_save(&mut vehicle, "AHRS_ORIENT", 0i8).unwrap();
        }

        let mut vehicle = Vehicle::new();
        vehicle.ahrs.orientation.set(5);
        let mut store = common::store(&mut eeprom);
        let _ = store.load_all(&mut vehicle);
        assert_eq!(vehicle.ins.gyro_offs.get(), Vector3f::new(0.1, 0.2, 0.3));
        assert_eq!(*vehicle.ahrs.orientation, 0);
    }
}

mod show {
    use crate::common;
    use crate::common::{EEPROM_SIZE, Eeprom, Vehicle};
    use ap_param::Vector3f;
    use pretty_assertions::assert_eq;

    #[test]
    fn show_all_lists_visible_scalars() {
        let mut eeprom = Eeprom::new(EEPROM_SIZE);
        let mut vehicle = Vehicle::new();
        vehicle.ins.accel_offs.set(Vector3f::new(0.5, 0.0, -1.0));
        let store = common::store(&mut eeprom);

        let mut out = String::new();
        store.show_all(&vehicle, &mut out, false).unwrap();
        assert_eq!(
            out,
            "\
FORMAT_VERSION: 12
SYSID_THISMAV: 1
INS_GYROFFS_X: 0
INS_GYROFFS_Y: 0
INS_GYROFFS_Z: 0
INS_ACCOFFS_X: 0.5
INS_ACCOFFS_Y: 0
INS_ACCOFFS_Z: -1
INS_GYRO_FILTER: 20
MOT_ENABLE: 1
MOT_PWM_MIN: 1000
MOT_SPIN_MAX: 0.95
MOT_BAT_VOLT_MAX: 0
MOT_BAT_VOLT_MIN: 0
AHRS_GPS_GAIN: 1
AHRS_ORIENT: 0
"
        );
    }

    #[test]
    fn show_all_with_keys() {
        let mut eeprom = Eeprom::new(EEPROM_SIZE);
        let mut vehicle = Vehicle::new();
        vehicle.motors.enable.set(0);
        let store = common::store(&mut eeprom);

        let mut out = String::new();
        store.show_all(&vehicle, &mut out, true).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 12);
        assert_eq!(lines[9], "Key 5:1 MOT_ENABLE: 0");
        assert_eq!(lines[10], "Key 7:65 AHRS_GPS_GAIN: 1");
    }

    #[test]
    fn show_single() {
        let mut eeprom = Eeprom::new(EEPROM_SIZE);
        let mut vehicle = Vehicle::new();
        vehicle.ins.gyro_offs.set(Vector3f::new(1.5, 0.0, -2.0));
        let store = common::store(&mut eeprom);

        let mut out = String::new();
        let (token, _) = store.find(&vehicle, "INS_GYROFFS").unwrap();
        store.show(&vehicle, token, &mut out).unwrap();
        let (token, _) = store.find(&vehicle, "MOT_PWM_MIN").unwrap();
        store.show(&vehicle, token, &mut out).unwrap();
        let (token, _) = store.find(&vehicle, "MOT_BAT").unwrap();
        store.show(&vehicle, token, &mut out).unwrap();

        assert_eq!(out, "INS_GYROFFS: 1.5 0 -2\nMOT_PWM_MIN: 1000\n");
    }
}
