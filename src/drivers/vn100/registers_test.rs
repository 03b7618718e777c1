use crate::drivers::vn100::{
    error::VnError,
    registers::{self, checksum, frame, parse_response},
};

#[test]
fn test_checksum() {
    // Known checksums from the VN-100 user manual
    assert_eq!(checksum("VNRRG,1"), 0x42);
    assert_eq!(checksum("VNTAR"), 0x5F);
}

#[test]
fn test_frame() {
    assert_eq!(frame("VNRRG,1"), "$VNRRG,1*42\r\n");
    assert_eq!(frame("VNTAR"), "$VNTAR*5F\r\n");
}

#[test]
fn test_parse_response() {
    let response = parse_response("$VNRRG,1*42\r\n").unwrap();
    assert_eq!(response.command, "VNRRG");
    assert_eq!(response.fields, vec!["1".to_string()]);
}

#[test]
fn test_parse_response_bad_checksum() {
    let result = parse_response("$VNRRG,1*43\r\n");
    assert!(matches!(result, Err(VnError::InvalidChecksum)));
}

#[test]
fn test_parse_response_malformed() {
    assert!(matches!(
        parse_response("VNRRG,1*42"),
        Err(VnError::MalformedResponse(_))
    ));
    assert!(matches!(
        parse_response("$VNRRG,1"),
        Err(VnError::MalformedResponse(_))
    ));
}

#[test]
fn test_parse_vnerr() {
    let body = "VNERR,9";
    let line = frame(body);
    let result = parse_response(&line);
    assert!(matches!(result, Err(VnError::UnauthorizedAccess)));

    let line = frame("VNERR,12");
    assert!(matches!(
        parse_response(&line),
        Err(VnError::InsufficientBaudRate)
    ));
}

#[test]
fn test_from_code() {
    assert!(matches!(VnError::from_code(8), VnError::InvalidRegister));
    assert_eq!(VnError::from_code(8).to_string(), "invalid register");
    assert!(matches!(VnError::from_code(200), VnError::UnknownErrorCode(200)));
}

#[test]
fn test_write_register_body() {
    let body = registers::write_register(5, &["921600".to_string()]);
    assert_eq!(body, "VNWRG,5,921600");
}

#[test]
fn test_error_severity() {
    assert!(VnError::HardFault.is_fatal());
    assert!(VnError::UnauthorizedAccess.is_fatal());
    assert!(VnError::NotConnected.is_fatal());
    assert!(!VnError::Timeout.is_fatal());
    assert!(!VnError::InvalidChecksum.is_fatal());
    assert!(!VnError::InvalidParameter.is_fatal());
}
