//! End-to-end tests for the Converter API.

use blockport::{
    BlockportError, Converter, ErrorCode, ExtractError, MemoryArchive,
    config::{AppConfig, CodegenConfig, LayoutConfig},
    structure::MAX_NESTING,
};
use serde_json::{Value, json};

fn body(conversion: &blockport::Conversion) -> Vec<&str> {
    conversion
        .program()
        .body()
        .iter()
        .map(String::as_str)
        .collect()
}

fn codes(conversion: &blockport::Conversion) -> Vec<Option<ErrorCode>> {
    conversion.diagnostics().iter().map(|d| d.code()).collect()
}

fn project(blocks: Value) -> MemoryArchive {
    let project = json!({
        "targets": [{ "isStage": false, "name": "Hub", "blocks": blocks }]
    });
    let bytes = serde_json::to_vec(&project).expect("Failed to serialize project");
    MemoryArchive::new().with_entry("project.json", bytes)
}

#[test]
fn test_three_blocks_in_reading_order() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
        <g transform="translate(10, 80)">
            <rect width="120" height="30"/>
            <text x="4" y="20">led set to red</text>
        </g>
        <g transform="translate(10, 0)">
            <rect width="160" height="30"/>
            <text x="4" y="20">when program starts</text>
        </g>
        <g transform="translate(10, 40)">
            <rect width="200" height="30"/>
            <text x="4" y="20">motor A run for 3 seconds</text>
        </g>
    </svg>"#;

    let conversion = Converter::default().convert_diagram(svg);

    assert_eq!(
        body(&conversion),
        vec![
            "# when program starts",
            "hub.port.A.motor.run_for_seconds(3.0)",
            "hub.led('red')",
        ]
    );
    assert!(conversion.diagnostics().is_empty());

    let source = conversion.program().source();
    assert_eq!(source.matches("def main():").count(), 1);
    assert!(source.contains("from spike import PrimeHub\n"));
    assert!(source.ends_with("if __name__ == \"__main__\":\n    main()\n"));
}

#[test]
fn test_loop_body_from_indentation() {
    let svg = r#"<svg>
        <text x="0" y="0">repeat 5 times</text>
        <text x="20" y="40">motor A stop</text>
        <text x="20" y="80">wait 2 seconds</text>
        <text x="0" y="120">print "done"</text>
    </svg>"#;

    let conversion = Converter::default().convert_diagram(svg);

    assert_eq!(
        body(&conversion),
        vec![
            "for _ in range(5):",
            "hub.port.A.motor.stop()",
            "time.sleep(2.0)",
            "print('done')",
        ]
    );
    assert!(conversion.program().source().contains(
        "    for _ in range(5):\n        hub.port.A.motor.stop()\n        time.sleep(2.0)\n    print('done')\n"
    ));
    let imports: Vec<_> = conversion.program().imports().iter().cloned().collect();
    assert_eq!(imports, vec!["from spike import PrimeHub", "import time"]);
}

#[test]
fn test_stop_is_not_run() {
    let conversion = Converter::default().convert_diagram(r#"<svg><text>motor A stop</text></svg>"#);
    assert_eq!(body(&conversion), vec!["hub.port.A.motor.stop()"]);
}

#[test]
fn test_empty_archive_fails_without_output() {
    let result = Converter::default().convert_archive(&mut MemoryArchive::new());
    assert!(matches!(
        result,
        Err(BlockportError::Extract(ExtractError::NoEntries))
    ));
}

#[test]
fn test_missing_duration_uses_default() {
    let conversion = Converter::default().convert_diagram(r#"<svg><text>wait seconds</text></svg>"#);

    assert_eq!(body(&conversion), vec!["time.sleep(1.0)"]);
    assert_eq!(codes(&conversion), vec![Some(ErrorCode::W300)]);
}

#[test]
fn test_unknown_block_is_kept_as_comment() {
    let svg = r#"<svg>
        <text x="0" y="0">forever</text>
        <text x="20" y="40">do a barrel roll</text>
    </svg>"#;
    let conversion = Converter::default().convert_diagram(svg);

    assert_eq!(body(&conversion), vec!["while True:", "# do a barrel roll", "pass"]);
    assert_eq!(codes(&conversion), vec![Some(ErrorCode::W200)]);
    assert_eq!(conversion.program().block_count(), 2);
}

#[test]
fn test_malformed_diagram_degrades_to_empty_program() {
    let conversion = Converter::default().convert_diagram("<svg><text>unclosed");

    assert!(conversion.program().body().is_empty());
    assert!(conversion.program().source().contains("    pass\n"));
    assert_eq!(codes(&conversion), vec![Some(ErrorCode::W100)]);
}

#[test]
fn test_archive_project_nests_by_stack() {
    let mut archive = project(json!({
        "start": { "opcode": "flipperevents_whenProgramStarts", "topLevel": true,
                   "next": "loop", "x": 0, "y": 0 },
        "loop": { "opcode": "control_forever", "next": null,
                  "inputs": { "SUBSTACK": [2, "light"] } },
        "light": { "opcode": "flipperlight_centerButtonLight", "next": null,
                   "inputs": { "COLOR": [1, "menu"] } },
        "menu": { "opcode": "flipperlight_color-selector-vertical", "shadow": true,
                  "fields": { "field_flipperlight_color-selector-vertical": ["red", null] } }
    }));

    let conversion = Converter::default()
        .convert_archive(&mut archive)
        .expect("Failed to convert archive");

    assert_eq!(
        body(&conversion),
        vec!["# when program starts", "while True:", "hub.led('red')"]
    );
    assert!(conversion.diagnostics().is_empty());
    assert!(conversion.diagram().is_none());
}

#[test]
fn test_archive_else_branch_is_negated_if() {
    let mut archive = project(json!({
        "if": { "opcode": "control_if_else", "topLevel": true, "next": null,
                "inputs": { "CONDITION": [2, "var"],
                            "SUBSTACK": [2, "a"], "SUBSTACK2": [2, "b"] } },
        "var": { "opcode": "data_variable", "fields": { "VARIABLE": ["ready", "v1"] } },
        "a": { "opcode": "looks_say", "next": null, "inputs": { "MESSAGE": [1, [10, "yes"]] } },
        "b": { "opcode": "looks_say", "next": null, "inputs": { "MESSAGE": [1, [10, "no"]] } }
    }));

    let conversion = Converter::default()
        .convert_archive(&mut archive)
        .expect("Failed to convert archive");

    assert_eq!(
        body(&conversion),
        vec!["if ready:", "print('yes')", "if not (ready):", "print('no')"]
    );
}

#[test]
fn test_indent_unit_follows_config() {
    let svg = r#"<svg>
        <text x="0" y="0">forever</text>
        <text x="20" y="40">wait 1 seconds</text>
    </svg>"#;
    let config = AppConfig::new(LayoutConfig::new(40.0, 40.0), CodegenConfig::default());
    let conversion = Converter::new(config).convert_diagram(svg);

    assert_eq!(body(&conversion), vec!["while True:", "pass", "time.sleep(1.0)"]);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = AppConfig::new(LayoutConfig::default(), CodegenConfig::new(0, true));
    assert!(matches!(
        Converter::try_new(config),
        Err(BlockportError::Config(_))
    ));
}

#[test]
fn test_conversion_is_deterministic() {
    let svg = r#"<svg>
        <g transform="translate(0 0)"><rect width="10" height="10"/><text>when program starts</text></g>
        <g transform="translate(20 40)"><rect width="10" height="10"/><text>if distance &lt; 10 then</text></g>
        <g transform="translate(40 80)"><rect width="10" height="10"/><text>play beep 440 for 0.2</text></g>
        <g transform="translate(20 120)"><rect width="10" height="10"/><text>set speed to 50</text></g>
    </svg>"#;

    let converter = Converter::default();
    let first = converter.convert_diagram(svg);
    let second = converter.convert_diagram(svg);

    assert_eq!(first.program(), second.program());
    assert_eq!(codes(&first), codes(&second));
}

#[test]
fn test_deep_staircase_diagram_is_flattened() {
    const ROWS: usize = 50_000;

    let mut svg = String::from("<svg>");
    for i in 0..ROWS {
        svg.push_str(&format!(r#"<text x="{}" y="{}">forever</text>"#, i * 20, i * 40));
    }
    svg.push_str("</svg>");

    let conversion = Converter::default().convert_diagram(&svg);
    let program = conversion.program();

    assert_eq!(program.block_count(), ROWS);
    assert_eq!(codes(&conversion), vec![Some(ErrorCode::W201)]);

    let deepest = program
        .source()
        .lines()
        .map(|line| line.len() - line.trim_start().len())
        .max();
    assert_eq!(deepest, Some((MAX_NESTING + 1) * 4));
}

#[test]
fn test_deep_archive_stack_converts() {
    const DEPTH: usize = 5_000;

    let mut blocks = serde_json::Map::new();
    for i in 0..DEPTH {
        let inputs = if i + 1 < DEPTH {
            json!({ "SUBSTACK": [2, format!("loop{}", i + 1)] })
        } else {
            json!({})
        };
        let top_level = i == 0;
        blocks.insert(
            format!("loop{i}"),
            json!({
                "opcode": "control_forever", "next": null,
                "inputs": inputs, "fields": {},
                "shadow": false, "topLevel": top_level
            }),
        );
    }

    let conversion = Converter::default()
        .convert_archive(&mut project(Value::Object(blocks)))
        .expect("Conversion failed");

    assert_eq!(conversion.program().block_count(), DEPTH);
    assert!(codes(&conversion).contains(&Some(ErrorCode::W201)));
}

#[test]
fn test_keyword_conditions_stay_valid_python() {
    let svg = r#"<svg>
        <text x="0" y="0">if pass then</text>
        <text x="20" y="40">wait 1 seconds</text>
        <text x="0" y="80">if while</text>
    </svg>"#;

    let conversion = Converter::default().convert_diagram(svg);

    assert_eq!(
        body(&conversion),
        vec![
            "if True:  # pass",
            "time.sleep(1.0)",
            "if True:  # while",
            "pass",
        ]
    );
}

#[test]
fn test_repeat_until_is_kept_as_comment() {
    let conversion = Converter::default()
        .convert_diagram(r#"<svg><text>repeat until distance &lt; 10</text></svg>"#);

    assert_eq!(body(&conversion), vec!["# repeat until distance < 10"]);
    assert_eq!(codes(&conversion), vec![Some(ErrorCode::W200)]);
}
