use std::fs;

use shader_builder::builder::{assemble_body, merge_constants, normalize_body};
use shader_builder::parser::parse_file;
use shader_builder::{
    build, BuildError, BuildResult, BuildSettings, FileAssetLoader, MemoryAssetLoader, NumericSetting,
    ShaderCompiler, StageType,
};

// Compiler stand-in that records what it was given
struct RecordingCompiler {
    fail_with: Option<String>,
    compiled: Vec<(StageType, String)>,
}

impl ShaderCompiler for RecordingCompiler {
    type Handle = usize;

    fn compile(&mut self, stage: StageType, source: &str) -> Result<usize, String> {
        if let Some(message) = &self.fail_with {
            return Err(message.clone());
        }
        self.compiled.push((stage, source.to_string()));
        Ok(self.compiled.len())
    }
}

fn simple_shader() -> BuildResult {
    let loader = MemoryAssetLoader::new().with(
        "main.vert",
        "#version 300 es\n#type VERTEX\nprecision highp float;\nvoid main() { gl_Position = vec4(0.5); }\n",
    );
    build(loader, "", "main.vert", &BuildSettings::new()).expect("build failed")
}

#[cfg(test)]
mod disk_tests {
    use super::*;

    #[test]
    fn test_build_from_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("lib")).expect("create lib");
        fs::write(
            dir.path().join("lib/noise.glsl"),
            "#version 100\nconst float SCALE = 0.25;\nfloat noise(float x) { return x * SCALE; }\n",
        )
        .expect("write include");
        fs::write(
            dir.path().join("water.frag"),
            "#version 300 es\r\n#type FRAGMENT\r\nprecision mediump float;\r\n#include \"lib/noise.glsl\"\r\nfloat level = noise(0.25);\r\n",
        )
        .expect("write main");

        let result = build(FileAssetLoader, dir.path(), "water.frag", &BuildSettings::new()).expect("build failed");
        assert_eq!(
            result.source.lines().collect::<Vec<_>>(),
            vec![
                "#version 300 es",
                "precision mediump float;",
                "const float SCALE = 0.25;",
                "float noise ( float x ) { return x * SCALE ; }",
                "float level = noise ( SCALE ) ;",
            ]
        );
        assert_eq!(result.line_info(3).map(|r| r.to_string()), Some("lib/noise.glsl:2".to_string()));
        assert_eq!(result.path, "water.frag");
    }

    #[test]
    fn test_missing_entry_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = build(FileAssetLoader, dir.path(), "absent.frag", &BuildSettings::new()).unwrap_err();
        match err {
            BuildError::Io { path, .. } => assert_eq!(path, dir.path().join("absent.frag")),
            other => panic!("expected io error, got {:?}", other),
        }
    }

    #[test]
    fn test_settings_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"SHADOWS": false, "LIGHTS": 4, "GAMMA": 2.2}"#).expect("write settings");

        let settings = BuildSettings::from_json_file(&path).expect("settings should load");
        assert_eq!(settings.booleans.get("SHADOWS"), Some(&false));
        assert_eq!(settings.numbers.get("LIGHTS"), Some(&NumericSetting::Int(4)));
        assert_eq!(settings.numbers.get("GAMMA"), Some(&NumericSetting::Float(2.2)));
    }
}

#[cfg(test)]
mod settings_tests {
    use super::*;

    #[test]
    fn test_assignments() {
        let settings = BuildSettings::from_assignments("DEBUG=true LIGHTS=4 'SCALE=0.5'").expect("should parse");
        assert_eq!(settings.booleans.get("DEBUG"), Some(&true));
        assert_eq!(settings.numbers.get("LIGHTS"), Some(&NumericSetting::Int(4)));
        assert_eq!(settings.numbers.get("SCALE"), Some(&NumericSetting::Float(0.5)));
    }

    #[test]
    fn test_invalid_assignments() {
        assert!(matches!(
            BuildSettings::from_assignments("DEBUG"),
            Err(BuildError::InvalidSetting(_))
        ));
        assert!(matches!(
            BuildSettings::from_assignments("=1"),
            Err(BuildError::InvalidSetting(_))
        ));
        assert!(matches!(
            BuildSettings::from_assignments("MODE=fast"),
            Err(BuildError::InvalidSetting(_))
        ));
        assert!(matches!(
            BuildSettings::from_assignments("A='unterminated"),
            Err(BuildError::InvalidSetting(_))
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(BuildSettings::from_json("[1, 2]"), Err(BuildError::Settings(_))));
        assert!(matches!(
            BuildSettings::from_json(r#"{"NAME": "text"}"#),
            Err(BuildError::Settings(_))
        ));
    }

    #[test]
    fn test_merge_later_wins() {
        let mut settings = BuildSettings::new().with_bool("FOG", true).with_int("LIGHTS", 2);
        settings.merge(BuildSettings::new().with_float("FOG", 0.5).with_bool("LIGHTS", false));

        assert_eq!(settings.numbers.get("FOG"), Some(&NumericSetting::Float(0.5)));
        assert_eq!(settings.booleans.get("LIGHTS"), Some(&false));
        assert!(!settings.booleans.contains_key("FOG"), "a name is either boolean or numeric");
        assert!(!settings.numbers.contains_key("LIGHTS"), "a name is either boolean or numeric");
    }
}

#[cfg(test)]
mod output_tests {
    use super::*;

    #[test]
    fn test_compile_passes_stage_and_source() {
        let result = simple_shader();
        let mut compiler = RecordingCompiler {
            fail_with: None,
            compiled: Vec::new(),
        };
        let handle = result.compile(&mut compiler).expect("compile should succeed");
        assert_eq!(handle, 1);
        assert_eq!(compiler.compiled[0].0, StageType::Vertex);
        assert_eq!(compiler.compiled[0].1, result.source);
    }

    #[test]
    fn test_compile_failure_carries_markup() {
        let result = simple_shader();
        let mut compiler = RecordingCompiler {
            fail_with: Some("ERROR: 0:4: syntax error".to_string()),
            compiled: Vec::new(),
        };
        match result.compile(&mut compiler) {
            Err(BuildError::Compile { path, message, markup }) => {
                assert_eq!(path, "main.vert");
                assert_eq!(message, "ERROR: 0:4: syntax error");
                assert!(markup.contains("// (main.vert:4)"), "markup should map line 4 back to its source");
            }
            other => panic!("expected compile error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_json_output() {
        let result = simple_shader();
        let value = serde_json::to_value(&result).expect("serializable");
        assert_eq!(value["stage"], "VERTEX");
        assert_eq!(value["line_table"][0]["file"], "main.vert");
        assert_eq!(value["line_table"][0]["line"], 1);
        assert!(value["line_table"][2]["line"].is_null(), "generated constants have no source line");
    }

    #[test]
    fn test_normalizing_twice_changes_nothing() {
        let text = r#"#version 300 es
#type FRAGMENT
precision mediump float;
const int I_2 = 5;
const float HALF = 0.5;
float a = 0.5 * 2.0 + 1.0e-3;
int b = 2 + 5 + 7;
"#;
        let files = vec![parse_file("main.glsl", text, &BuildSettings::new(), true).expect("parse failed")];
        let constants = merge_constants(&files).expect("merge failed");
        let (constants, body) = normalize_body(constants, assemble_body(&files));

        let generated: Vec<&str> = constants.iter().skip(2).map(|c| c.name.as_str()).collect();
        assert_eq!(generated, vec!["I_2_1", "I_7", "F_2_0", "F_0_001"]);

        let (again_constants, again_body) = normalize_body(constants.clone(), body.clone());
        assert_eq!(again_constants, constants, "a second pass must not add constants");
        assert_eq!(again_body, body, "a second pass must not change code");
    }
}
