use super::*;
use std::path::PathBuf;

#[test]
fn test_parse_inspect_command() {
    let cli = parse_args(["quantcal", "inspect", "layer_statistics.txt"]).unwrap();
    match cli.command {
        Command::Inspect(args) => {
            assert_eq!(args.snapshot, PathBuf::from("layer_statistics.txt"));
        }
        _ => panic!("Expected Inspect command"),
    }
    assert!(!cli.verbose);
    assert!(!cli.quiet);
}

#[test]
fn test_parse_quantize_with_scales() {
    let cli = parse_args([
        "quantcal",
        "quantize",
        "graph.yaml",
        "--scale",
        "2048",
        "-s",
        "0.5",
        "--stats",
        "calib.txt",
        "--format",
        "json",
    ])
    .unwrap();

    match cli.command {
        Command::Quantize(args) => {
            assert_eq!(args.graph, PathBuf::from("graph.yaml"));
            assert_eq!(args.scales, vec![2048.0, 0.5]);
            assert_eq!(args.stats, Some(PathBuf::from("calib.txt")));
            assert_eq!(args.config, None);
            assert_eq!(args.format, OutputFormat::Json);
        }
        _ => panic!("Expected Quantize command"),
    }
}

#[test]
fn test_quantize_defaults() {
    let cli = parse_args(["quantcal", "quantize", "graph.yaml"]).unwrap();
    match cli.command {
        Command::Quantize(args) => {
            assert!(args.scales.is_empty());
            assert_eq!(args.format, OutputFormat::Text);
        }
        _ => panic!("Expected Quantize command"),
    }
}

#[test]
fn test_global_flags() {
    let cli = parse_args(["quantcal", "inspect", "s.txt", "--verbose"]).unwrap();
    assert!(cli.verbose);
    let cli = parse_args(["quantcal", "-q", "inspect", "s.txt"]).unwrap();
    assert!(cli.quiet);
}

#[test]
fn test_invalid_format_rejected() {
    let result = parse_args(["quantcal", "quantize", "g.yaml", "--format", "xml"]);
    assert!(result.is_err());
}

#[test]
fn test_missing_subcommand_rejected() {
    assert!(parse_args(["quantcal"]).is_err());
}

#[test]
fn test_output_format_parse() {
    assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
    assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
    assert!("yaml".parse::<OutputFormat>().is_err());
    assert_eq!(OutputFormat::Json.to_string(), "json");
}
