//! Markdown step-summary rendering.
//!
//! Produces the report appended to `GITHUB_STEP_SUMMARY` after a run:
//! status, configuration, the prompt, the captured output, and hints when
//! the run failed or timed out.

use crate::config::Config;
use crate::exec::Outcome;
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Prompts longer than this many characters are truncated.
pub const PROMPT_MAX_CHARS: usize = 300;

/// Successful output longer than this many characters is truncated.
pub const RESULT_MAX_CHARS: usize = 3000;

const CODE_INDICATORS: &[&str] = &[
    "function", "class", "def ", "import ", "const ", "let ", "var ", "public ", "private ",
    "protected", "return ", "if (", "for (", "while (", "{", "}", ";", "//", "/*", "*/",
    "#include", "package ", "use ",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Success,
    Failed,
    TimedOut,
}

impl Status {
    fn of(outcome: &Outcome) -> Self {
        if outcome.timed_out {
            Status::TimedOut
        } else if outcome.exit_code == 0 {
            Status::Success
        } else {
            Status::Failed
        }
    }
}

/// Render the step summary for one run.
pub fn render_summary(config: &Config, outcome: &Outcome, now: DateTime<Utc>) -> String {
    let status = Status::of(outcome);
    let result = outcome.captured.as_str();
    let mut md = String::new();

    // `write!` into a String cannot fail.
    let _ = write_header(&mut md, status, config, outcome.exit_code);
    let _ = write_configuration(&mut md, config);
    let _ = write_prompt(&mut md, &config.prompt);
    let _ = write_output(&mut md, status, config, result);
    let _ = write_warnings(&mut md, &outcome.warnings);
    let _ = write_metrics(&mut md, status, config, result, now);

    md.push_str("---\n");
    md.push_str("*🤖 Generated by [iFlow CLI Action](https://github.com/iflow-ai/iflow-cli-action)*\n\n");
    md
}

fn write_header(md: &mut String, status: Status, config: &Config, exit_code: i32) -> std::fmt::Result {
    match status {
        Status::TimedOut => md.push_str("## ⏰ iFlow CLI Execution Summary - Timeout\n\n"),
        Status::Success => md.push_str("## ✅ iFlow CLI Execution Summary\n\n"),
        Status::Failed => md.push_str("## ❌ iFlow CLI Execution Summary\n\n"),
    }

    md.push_str("### 📊 Status\n\n");
    match status {
        Status::TimedOut => {
            md.push_str("⏰ **Execution**: Timed Out\n");
            writeln!(md, "🕒 **Timeout Duration**: {} seconds", config.timeout_secs)?;
            writeln!(md, "💥 **Exit Code**: {}\n", exit_code)?;
        }
        Status::Success => {
            md.push_str("🎉 **Execution**: Successful\n");
            md.push_str("🎯 **Exit Code**: 0\n\n");
        }
        Status::Failed => {
            md.push_str("⚠️ **Execution**: Failed\n");
            writeln!(md, "💥 **Exit Code**: {}\n", exit_code)?;
        }
    }
    Ok(())
}

fn write_configuration(md: &mut String, config: &Config) -> std::fmt::Result {
    md.push_str("### ⚙️ Configuration\n\n");
    md.push_str("| Setting | Value |\n");
    md.push_str("|---------|-------|\n");
    writeln!(md, "| Model | `{}` |", config.model)?;
    writeln!(md, "| Base URL | `{}` |", config.base_url)?;
    writeln!(md, "| Timeout | {} seconds |", config.timeout_secs)?;
    writeln!(md, "| Working Directory | `{}` |", config.working_dir.display())?;
    if !config.extra_args.is_empty() {
        writeln!(md, "| Extra Arguments | `{}` |", config.extra_args)?;
    }
    md.push('\n');
    Ok(())
}

fn write_prompt(md: &mut String, prompt: &str) -> std::fmt::Result {
    md.push_str("### 📝 Input Prompt\n\n");
    let mut shown = truncate_chars(prompt, PROMPT_MAX_CHARS).to_string();
    if shown.len() < prompt.len() {
        shown.push_str("...");
    }
    writeln!(md, "> {}\n", shown.replace('`', "\\`"))
}

fn write_output(md: &mut String, status: Status, config: &Config, result: &str) -> std::fmt::Result {
    md.push_str("### Output\n\n");

    if status == Status::Success {
        let mut display = truncate_chars(result, RESULT_MAX_CHARS).to_string();
        if display.len() < result.len() {
            display.push_str("\n\n... *(Output truncated. See full output in action logs)*");
        }

        if result.contains("```") {
            writeln!(md, "{}\n", display)?;
        } else if contains_code(result) {
            writeln!(md, "```\n{}\n```\n", display)?;
        } else {
            for line in display.split('\n') {
                if line.trim().is_empty() {
                    md.push_str(">\n");
                } else {
                    writeln!(md, "> {}", line)?;
                }
            }
            md.push('\n');
        }
        return Ok(());
    }

    writeln!(md, "```\n{}\n```\n", result)?;

    if status == Status::TimedOut {
        md.push_str("#### ⏰ Timeout Information\n\n");
        writeln!(md, "- **Configured Timeout**: {} seconds", config.timeout_secs)?;
        md.push_str("- **Reason**: The iFlow CLI command did not complete within the specified timeout period\n");
        md.push_str("- **Exit Code**: 124 (timeout)\n\n");

        md.push_str("#### 🔧 Timeout Troubleshooting\n\n");
        md.push_str("- **Increase timeout**: Consider increasing the timeout value if the task legitimately needs more time\n");
        md.push_str("- **Optimize prompt**: Try breaking down complex prompts into smaller, more focused requests\n");
        md.push_str("- **Check model performance**: Some models may require longer processing time\n");
        md.push_str("- **Network issues**: Verify network connectivity and API response times\n");
        md.push_str("- **Resource constraints**: Check if the system has sufficient resources (CPU, memory)\n\n");
    } else if result.contains("API Error") {
        md.push_str("#### 🔧 Troubleshooting Hints\n\n");
        md.push_str("- Check if your API key is valid and active\n");
        md.push_str("- Verify the base URL is accessible\n");
        md.push_str("- Ensure the selected model is available\n");
        md.push_str("- Try increasing the timeout value\n\n");
    }
    Ok(())
}

fn write_warnings(md: &mut String, warnings: &[String]) -> std::fmt::Result {
    if warnings.is_empty() {
        return Ok(());
    }
    md.push_str("### ⚠️ Output Streaming Warnings\n\n");
    for warning in warnings {
        writeln!(md, "- {}", warning)?;
    }
    md.push('\n');
    Ok(())
}

fn write_metrics(
    md: &mut String,
    status: Status,
    config: &Config,
    result: &str,
    now: DateTime<Utc>,
) -> std::fmt::Result {
    md.push_str("### 📈 Metrics\n\n");
    writeln!(md, "- **Execution Time**: {}", now.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(md, "- **Output Length**: {} characters", result.chars().count())?;
    match status {
        Status::TimedOut => {
            writeln!(md, "- **Timeout Duration**: {} seconds", config.timeout_secs)?;
            md.push_str("- **Success Rate**: 0% (Timeout)\n\n");
        }
        Status::Success => md.push_str("- **Success Rate**: 100%\n\n"),
        Status::Failed => md.push_str("- **Success Rate**: 0%\n\n"),
    }
    Ok(())
}

/// Heuristic: does `text` look like source code?
pub fn contains_code(text: &str) -> bool {
    let lower = text.to_lowercase();
    CODE_INDICATORS.iter().any(|ind| lower.contains(ind))
}

/// The first `max` characters of `text`.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::exec::RunError;
    use chrono::TimeZone;
    use std::path::PathBuf;
    use std::time::Duration;

    fn make_config() -> Config {
        Config {
            mode: Mode::GitHubActions,
            prompt: "Review the `main` branch".to_string(),
            api_key: "sk-secret".to_string(),
            settings_json: String::new(),
            base_url: "https://apis.iflow.cn/v1".to_string(),
            model: "Qwen3-Coder".to_string(),
            working_dir: PathBuf::from("/work"),
            timeout_secs: 600,
            extra_args: String::new(),
            precmd: String::new(),
            gh_version: String::new(),
            iflow_version: String::new(),
        }
    }

    fn outcome(captured: &str, exit_code: i32) -> Outcome {
        Outcome {
            captured: captured.to_string(),
            exit_code,
            timed_out: false,
            error: None,
            warnings: Vec::new(),
        }
    }

    fn timed_out(captured: &str) -> Outcome {
        Outcome {
            captured: captured.to_string(),
            exit_code: 124,
            timed_out: true,
            error: Some(RunError::Timeout {
                timeout: Duration::from_secs(600),
            }),
            warnings: Vec::new(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap()
    }

    #[test]
    fn relay_warnings_are_listed() {
        let mut run = outcome("partial", 0);
        run.warnings = vec!["stderr relay still running after drain grace period; detached".into()];

        let md = render_summary(&make_config(), &run, now());

        assert!(md.contains("### ⚠️ Output Streaming Warnings"));
        assert!(md.contains("- stderr relay still running after drain grace period; detached"));
    }

    #[test]
    fn no_warning_section_without_warnings() {
        let md = render_summary(&make_config(), &outcome("ok", 0), now());
        assert!(!md.contains("Output Streaming Warnings"));
    }

    #[test]
    fn success_summary_blockquotes_prose() {
        let md = render_summary(&make_config(), &outcome("All good.\n\nNo issues found.", 0), now());

        assert!(md.starts_with("## ✅ iFlow CLI Execution Summary\n\n"));
        assert!(md.contains("🎉 **Execution**: Successful"));
        assert!(md.contains("> All good.\n>\n> No issues found.\n"));
        assert!(md.contains("- **Success Rate**: 100%"));
        assert!(md.contains("- **Execution Time**: 2025-03-04 05:06:07 UTC"));
        assert!(!md.contains("sk-secret"));
    }

    #[test]
    fn success_summary_fences_code() {
        let md = render_summary(&make_config(), &outcome("fn main() { return; }", 0), now());
        assert!(md.contains("```\nfn main() { return; }\n```\n"));
    }

    #[test]
    fn success_summary_passes_existing_fences_through() {
        let text = "Here:\n```rust\nlet x = 1;\n```";
        let md = render_summary(&make_config(), &outcome(text, 0), now());
        assert!(md.contains(&format!("### Output\n\n{}\n\n", text)));
    }

    #[test]
    fn long_success_output_is_truncated() {
        let text = "a".repeat(RESULT_MAX_CHARS + 10);
        let md = render_summary(&make_config(), &outcome(&text, 0), now());

        assert!(md.contains("... *(Output truncated. See full output in action logs)*"));
        assert!(!md.contains(&"a".repeat(RESULT_MAX_CHARS + 1)));
        assert!(md.contains(&format!("- **Output Length**: {} characters", RESULT_MAX_CHARS + 10)));
    }

    #[test]
    fn prompt_is_escaped_and_truncated() {
        let md = render_summary(&make_config(), &outcome("ok", 0), now());
        assert!(md.contains("> Review the \\`main\\` branch\n"));

        let config = Config {
            prompt: "é".repeat(PROMPT_MAX_CHARS + 5),
            ..make_config()
        };
        let md = render_summary(&config, &outcome("ok", 0), now());
        assert!(md.contains(&format!("> {}...\n", "é".repeat(PROMPT_MAX_CHARS))));
    }

    #[test]
    fn failure_summary_fences_output_and_gives_api_hints() {
        let md = render_summary(&make_config(), &outcome("API Error: 401", 2), now());

        assert!(md.starts_with("## ❌ iFlow CLI Execution Summary"));
        assert!(md.contains("💥 **Exit Code**: 2"));
        assert!(md.contains("```\nAPI Error: 401\n```"));
        assert!(md.contains("#### 🔧 Troubleshooting Hints"));
        assert!(md.contains("- **Success Rate**: 0%\n"));
    }

    #[test]
    fn timeout_summary_explains_timeout() {
        let md = render_summary(&make_config(), &timed_out("partial output"), now());

        assert!(md.starts_with("## ⏰ iFlow CLI Execution Summary - Timeout"));
        assert!(md.contains("🕒 **Timeout Duration**: 600 seconds"));
        assert!(md.contains("```\npartial output\n```"));
        assert!(md.contains("#### ⏰ Timeout Information"));
        assert!(md.contains("- **Exit Code**: 124 (timeout)"));
        assert!(md.contains("- **Success Rate**: 0% (Timeout)"));
        assert!(!md.contains("Troubleshooting Hints"));
    }

    #[test]
    fn configuration_table_lists_extra_args_only_when_set() {
        let md = render_summary(&make_config(), &outcome("ok", 0), now());
        assert!(md.contains("| Model | `Qwen3-Coder` |"));
        assert!(md.contains("| Working Directory | `/work` |"));
        assert!(!md.contains("Extra Arguments"));

        let config = Config {
            extra_args: "--debug".to_string(),
            ..make_config()
        };
        let md = render_summary(&config, &outcome("ok", 0), now());
        assert!(md.contains("| Extra Arguments | `--debug` |"));
    }

    #[test]
    fn summary_ends_with_footer() {
        let md = render_summary(&make_config(), &outcome("ok", 0), now());
        assert!(md.ends_with("(https://github.com/iflow-ai/iflow-cli-action)*\n\n"));
    }

    #[test]
    fn code_detection() {
        assert!(contains_code("import os"));
        assert!(contains_code("Use the CLASS keyword"));
        assert!(!contains_code("Everything looks fine"));
    }

    #[test]
    fn truncate_chars_handles_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 5), "hi");
    }
}
