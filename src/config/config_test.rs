use crate::config::ImuConfig;

#[test]
fn test_defaults() {
    let config = ImuConfig::from_yaml("{}").unwrap();
    assert_eq!(config, ImuConfig::default());
    assert_eq!(config.port, "/dev/ttyUSB0");
    assert_eq!(config.baudrate, 921_600);
    assert_eq!(config.imu_rate, 100);
    assert!(config.binary_output);
    assert!(config.frame_rotation.is_none());
}

#[test]
fn test_parse_overrides() {
    let yaml = r#"
port: /dev/ttyUSB1
baudrate: 115200
frame_id: base_imu
imu_rate: 200
enable_mag: false
sync_rate: 0
"#;
    let config = ImuConfig::from_yaml(yaml).unwrap();
    assert_eq!(config.port, "/dev/ttyUSB1");
    assert_eq!(config.baudrate, 115_200);
    assert_eq!(config.frame_id, "base_imu");
    assert_eq!(config.imu_rate, 200);
    assert!(!config.enable_mag);
    assert_eq!(config.sync_rate, 0);
    // Unset fields keep their defaults
    assert!(config.enable_pres);
    assert!(config.enable_temp);
}

#[test]
fn test_parse_frame_rotation() {
    let yaml = r#"
frame_rotation:
  - [0.0, 0.0, -1.0]
  - [1.0, 0.0, 0.0]
  - [0.0, -1.0, 0.0]
"#;
    let config = ImuConfig::from_yaml(yaml).unwrap();
    let matrix = config.frame_rotation.unwrap();
    assert_eq!(matrix[0], [0.0, 0.0, -1.0]);
    assert_eq!(matrix[2], [0.0, -1.0, 0.0]);
}

#[test]
fn test_invalid_yaml() {
    assert!(ImuConfig::from_yaml("port: [nonsense").is_err());
}
