//! Bootstrap preamble prepended to every script.
//!
//! The preamble probes the interpreter's rendering toolkits in priority
//! order, selects the first one that is available, falls back to a toolkit
//! that always exists, and forces figures to stay invisible so plotting
//! works without a display.

/// Renders the fixed preamble for a toolkit priority list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bootstrap {
    /// Toolkits to try, highest priority first.
    pub toolkits: Vec<String>,
    /// Toolkit selected when none of `toolkits` is available.
    pub fallback: String,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self {
            toolkits: vec!["qt".to_string(), "fltk".to_string()],
            fallback: "gnuplot".to_string(),
        }
    }
}

impl Bootstrap {
    /// Create a bootstrap for the given priority list and fallback.
    pub fn new(toolkits: Vec<String>, fallback: impl Into<String>) -> Self {
        Self {
            toolkits,
            fallback: fallback.into(),
        }
    }

    /// Render the preamble. Always ends with a newline.
    pub fn render(&self) -> String {
        let mut out = String::from("% --- simflow bootstrap: graphics toolkit selection ---\n");

        if self.toolkits.is_empty() {
            out.push_str(&format!("graphics_toolkit(\"{}\");\n", quote(&self.fallback)));
        } else {
            out.push_str("available_toolkits = available_graphics_toolkits();\n");
            for (i, toolkit) in self.toolkits.iter().enumerate() {
                let keyword = if i == 0 { "if" } else { "elseif" };
                out.push_str(&format!(
                    "{keyword} (ismember(\"{name}\", available_toolkits))\n  graphics_toolkit(\"{name}\");\n",
                    name = quote(toolkit)
                ));
            }
            out.push_str(&format!(
                "else\n  graphics_toolkit(\"{}\");\nend\n",
                quote(&self.fallback)
            ));
        }

        out.push_str("set(0, 'DefaultFigureVisible', 'off');\n");
        out.push_str("% --- end bootstrap ---\n");
        out
    }
}

/// Escape a value for an Octave double-quoted string.
fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_priority_order() {
        let preamble = Bootstrap::default().render();

        let qt = preamble.find("ismember(\"qt\"").unwrap();
        let fltk = preamble.find("ismember(\"fltk\"").unwrap();
        let fallback = preamble.find("graphics_toolkit(\"gnuplot\")").unwrap();
        assert!(qt < fltk && fltk < fallback);

        assert!(preamble.contains("if (ismember(\"qt\""));
        assert!(preamble.contains("elseif (ismember(\"fltk\""));
        assert!(preamble.contains("else\n  graphics_toolkit(\"gnuplot\");\nend"));
        assert!(preamble.contains("set(0, 'DefaultFigureVisible', 'off');"));
        assert!(preamble.ends_with('\n'));
    }

    #[test]
    fn test_headless_comes_after_selection() {
        let preamble = Bootstrap::default().render();
        let end = preamble.find("\nend\n").unwrap();
        let headless = preamble.find("DefaultFigureVisible").unwrap();
        assert!(end < headless);
    }

    #[test]
    fn test_empty_priority_list_uses_fallback_directly() {
        let preamble = Bootstrap::new(vec![], "gnuplot").render();
        assert!(!preamble.contains("available_graphics_toolkits"));
        assert!(preamble.contains("graphics_toolkit(\"gnuplot\");"));
        assert!(preamble.contains("DefaultFigureVisible"));
    }

    #[test]
    fn test_names_are_quoted() {
        let preamble = Bootstrap::new(vec!["we\"ird".to_string()], "gnuplot").render();
        assert!(preamble.contains("ismember(\"we\\\"ird\""));
    }
}
