use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PixelmapError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(PixelmapError::io("x").to_string().contains("io error:"));
    assert!(
        PixelmapError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert!(
        PixelmapError::CursorRegression {
            current: 4,
            requested: 2
        }
        .to_string()
        .contains("cursor regression")
    );
}

#[test]
fn malformed_code_wraps_decoder_error() {
    let err = PixelmapError::from(TileCodeError::WrongLength {
        len: 767,
        expected: 768,
    });
    assert!(err.to_string().contains("767"));
    assert!(!err.is_transient());
}

#[test]
fn io_errors_are_transient() {
    let err = PixelmapError::from(std::io::Error::other("disk full"));
    assert!(err.is_transient());
    assert!(err.to_string().contains("disk full"));
    assert!(!PixelmapError::validation("x").is_transient());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PixelmapError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
