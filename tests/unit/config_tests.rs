// Options unit tests
// Loading from YAML files, environment substitution and validation

use std::io::Write;
use tempfile::NamedTempFile;
use watermark::{Options, OutputFormat, WatermarkError};

fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(yaml.as_bytes())
        .expect("Failed to write config");
    file
}

#[test]
fn test_can_load_options_from_file() {
    let file = write_config(
        r#"
type: image/jpeg
encoder_options: 0.6
pool_size: 8
"#,
    );

    let options = Options::from_file(file.path()).expect("Failed to load options");
    assert_eq!(options.output_type, OutputFormat::Jpeg);
    assert_eq!(options.encoder_options, 0.6);
    assert_eq!(options.pool_size, Some(8));
    assert_eq!(options.jpeg_quality(), 60);
}

#[test]
fn test_empty_mapping_keeps_defaults() {
    let file = write_config("{}\n");

    let options = Options::from_file(file.path()).unwrap();
    assert_eq!(options.output_type, OutputFormat::Png);
    assert_eq!(options.encoder_options, 0.92);
    assert!(options.pool_size.is_none());
    assert!(options.init.is_noop());
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Options::from_file(dir.path().join("absent.yaml")).unwrap_err();

    assert!(matches!(err, WatermarkError::Config(_)));
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_file_with_env_substitution() {
    std::env::set_var("WATERMARK_UNIT_OUTPUT_TYPE", "image/jpeg");
    std::env::set_var("WATERMARK_UNIT_POOL_SIZE", "3");
    let file = write_config(
        r#"
type: ${WATERMARK_UNIT_OUTPUT_TYPE}
pool_size: ${WATERMARK_UNIT_POOL_SIZE}
"#,
    );

    let options = Options::from_file(file.path()).unwrap();
    assert_eq!(options.output_type, OutputFormat::Jpeg);
    assert_eq!(options.pool_size, Some(3));
}

#[test]
fn test_lowercase_placeholders_are_left_alone() {
    // Only ${UPPER_CASE} names are substituted
    let err = Options::from_yaml_with_env("type: ${lowercase}").unwrap_err();
    assert!(matches!(err, WatermarkError::Config(_)));
}

#[test]
fn test_out_of_range_quality_in_file_is_rejected() {
    let file = write_config("encoder_options: 2.5\n");

    let err = Options::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("encoder_options"));
}

#[test]
fn test_malformed_yaml_is_rejected() {
    let file = write_config("type: [image/png\n");
    assert!(Options::from_file(file.path()).is_err());
}

#[test]
fn test_pool_size_yields_isolated_capped_pool() {
    let options = Options::default().with_pool_size(5);

    let first = options.requested_pool().unwrap();
    let second = options.requested_pool().unwrap();

    assert_eq!(first.capacity(), Some(5));
    assert!(!first.same_pool(&second));
}

#[test]
fn test_options_debug_hides_runtime_values() {
    let options = Options::default();
    let debug = format!("{:?}", options);

    assert!(debug.contains("Options"));
    assert!(debug.contains("encoder_options"));
}

#[test]
fn test_output_format_media_types() {
    assert_eq!(OutputFormat::Png.content_type(), "image/png");
    assert_eq!(OutputFormat::Jpeg.content_type(), "image/jpeg");
    assert_eq!("IMAGE/JPEG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);

    let err = "image/bmp".parse::<OutputFormat>().unwrap_err();
    assert!(err.to_string().contains("image/bmp"));
}
