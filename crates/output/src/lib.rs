use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use thiserror::Error;

const PRETTY_INDENT: &[u8] = b"    ";

/// Output format chosen by `--output-format`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    /// `yaml` in any case selects YAML; every other value, known or not,
    /// selects JSON.
    pub fn from_flag(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("yaml") {
            OutputFormat::Yaml
        } else {
            OutputFormat::Json
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to encode response as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode response as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Encode `value` in `format`. `pretty` only applies to JSON.
pub fn render<T: Serialize + ?Sized>(
    value: &T,
    format: OutputFormat,
    pretty: bool,
) -> Result<String, RenderError> {
    let json_value = serde_json::to_value(value)?;

    match format {
        OutputFormat::Json if pretty => to_pretty_json(&json_value),
        OutputFormat::Json => Ok(serde_json::to_string(&json_value)?),
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&json_value)?;
            Ok(yaml.trim_end_matches('\n').to_string())
        }
    }
}

fn to_pretty_json(value: &Value) -> Result<String, RenderError> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(PRETTY_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    // serde_json only ever writes valid UTF-8.
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub struct OutputRenderer {
    format: OutputFormat,
    pretty: bool,
}

impl OutputRenderer {
    pub fn new(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn pretty(&self) -> bool {
        self.pretty
    }

    pub fn render_to_string<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, RenderError> {
        render(value, self.format, self.pretty)
    }

    /// Print the rendered value to stdout followed by a newline.
    pub fn render<T: Serialize + ?Sized>(&self, value: &T) -> anyhow::Result<()> {
        let rendered = self.render_to_string(value)?;
        println!("{rendered}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct TestAlert {
        id: String,
        tiny_id: String,
        count: i32,
        tags: Vec<String>,
    }

    fn sample() -> TestAlert {
        TestAlert {
            id: "8418d193-2dab-4490-b331-8c02cdd196b7".to_string(),
            tiny_id: "42".to_string(),
            count: 3,
            tags: vec!["db".to_string(), "critical".to_string()],
        }
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Json);
    }

    #[test]
    fn test_format_flag_is_case_insensitive() {
        assert_eq!(OutputFormat::from_flag("yaml"), OutputFormat::Yaml);
        assert_eq!(OutputFormat::from_flag("YAML"), OutputFormat::Yaml);
        assert_eq!(OutputFormat::from_flag("Yaml"), OutputFormat::Yaml);
        assert_eq!(OutputFormat::from_flag("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flag("JSON"), OutputFormat::Json);
    }

    #[test]
    fn test_unknown_format_falls_back_to_json() {
        assert_eq!(OutputFormat::from_flag("xml"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flag(""), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flag("yml"), OutputFormat::Json);
    }

    #[test]
    fn test_yaml_rendering_ignores_case_and_pretty() {
        let lower = render(&sample(), OutputFormat::from_flag("yaml"), false).unwrap();
        let upper = render(&sample(), OutputFormat::from_flag("YAML"), true).unwrap();
        assert_eq!(lower, upper);
        assert!(lower.contains("tinyId: '42'"));
        assert!(!lower.ends_with('\n'));
    }

    #[test]
    fn test_unknown_format_renders_compact_json() {
        let rendered = render(&sample(), OutputFormat::from_flag("xml"), false).unwrap();
        assert!(!rendered.contains('\n'));
        let parsed: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["tinyId"], "42");
    }

    #[test]
    fn test_pretty_json_compacts_to_compact_json() {
        let pretty = render(&sample(), OutputFormat::Json, true).unwrap();
        let compact = render(&sample(), OutputFormat::Json, false).unwrap();

        assert!(pretty.contains("\n    \"count\": 3"));
        let reparsed: Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(serde_json::to_string(&reparsed).unwrap(), compact);
    }

    #[test]
    fn test_unencodable_value_is_an_error() {
        let mut bad = HashMap::new();
        bad.insert((1, 2), "tuple keys cannot become JSON object keys");

        let err = render(&bad, OutputFormat::Json, false).unwrap_err();
        assert!(matches!(err, RenderError::Json(_)));
        assert!(render(&bad, OutputFormat::Yaml, false).is_err());
    }

    #[test]
    fn test_renderer_new() {
        let renderer = OutputRenderer::new(OutputFormat::Yaml, true);
        assert_eq!(renderer.format(), OutputFormat::Yaml);
        assert!(renderer.pretty());
    }

    #[test]
    fn test_render_prints() {
        let renderer = OutputRenderer::new(OutputFormat::Json, false);
        assert!(renderer.render(&sample()).is_ok());

        let renderer = OutputRenderer::new(OutputFormat::Yaml, false);
        assert!(renderer.render(&vec![sample(), sample()]).is_ok());
    }

    #[test]
    fn test_render_error_propagates_through_renderer() {
        let mut bad = HashMap::new();
        bad.insert(vec![1u8], 1);
        let renderer = OutputRenderer::new(OutputFormat::Json, true);
        assert!(renderer.render(&bad).is_err());
    }
}
